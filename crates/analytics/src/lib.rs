//! Matching and statistical aggregation for the GPU rental market pipeline.
//!
//! This crate handles:
//! - Exact-key ask/bid matching (spread derivation)
//! - Percentile distributions via interpolated order statistics
//! - Per-bucket and per-size aggregation (prices, spreads, supply)
//! - Whole-run market summary for the reporting layer

pub mod aggregate;
pub mod matcher;
pub mod percentile;
pub mod summary;

pub use aggregate::{
    discount_vs_baseline, discounts_by_size, distinct_listings_by_size, group_by_bucket,
    price_percentiles_by_bucket, spread_percentiles_by_bucket, spread_summary_by_bucket,
    supply_by_bucket, unit_price_median_by_size, unit_price_median_by_size_and_bucket,
    SupplyCount,
};
pub use matcher::{match_offers, match_offers_at_size};
pub use percentile::{percentile_summary, quantile, summary_stats, PercentilePoint, SummaryStats};
pub use summary::{summarize, MarketSummary, PercentileRow, SizeBreakdown};
