//! Whole-run market summary for the reporting layer.
//!
//! Typed equivalent of the end-of-run report: data range, matched-pair
//! counts, side-by-side percentiles, spread statistics, and a per-size
//! breakdown. Rendering is the consumer's problem.

use crate::aggregate::{distinct_listings_by_size, unit_price_median_by_size};
use crate::percentile::{percentile_summary, summary_stats, SummaryStats};
use gpumarket_core::config::ReportConfig;
use gpumarket_core::{MatchedPair, Offer, TimeBucket};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One percentile rank with ask and bid values side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileRow {
    pub rank: f64,
    pub ask: f64,
    pub bid: f64,
    /// Ask percentile minus bid percentile at this rank.
    pub spread: f64,
}

/// Per-configuration-size breakdown.
///
/// Discounts are `None` when the side lacks a size-1 baseline or has no
/// data at this size; absence is explicit, never a divide-by-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeBreakdown {
    pub config_size: u32,
    /// Distinct ask listings at this size (supply view).
    pub ask_listings: usize,
    pub ask_unit_median: Option<f64>,
    pub bid_unit_median: Option<f64>,
    pub ask_discount_pct: Option<f64>,
    pub bid_discount_pct: Option<f64>,
}

/// Whole-run summary consumed by an external reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    /// Earliest bucket observed on either side.
    pub first_bucket: TimeBucket,
    /// Latest bucket observed on either side.
    pub last_bucket: TimeBucket,
    /// Distinct buckets observed on either side.
    pub bucket_count: usize,
    /// Matched pairs at the report's configured size.
    pub matched_pairs: usize,
    /// Whole-run side-by-side percentiles of total price at the report
    /// size; empty when either side has no data at that size.
    pub percentiles: Vec<PercentileRow>,
    /// Whole-run spread statistics; `None` when no pairs matched.
    pub spread: Option<SummaryStats>,
    /// Per-size breakdown over every size present on either side.
    pub sizes: Vec<SizeBreakdown>,
}

/// Build the whole-run summary. Returns `None` when both sides are empty.
pub fn summarize(
    asks: &[Offer],
    bids: &[Offer],
    pairs: &[MatchedPair],
    config: &ReportConfig,
) -> Option<MarketSummary> {
    let buckets: BTreeSet<TimeBucket> = asks
        .iter()
        .chain(bids)
        .map(|o| o.bucket)
        .collect();
    let first_bucket = *buckets.first()?;
    let last_bucket = *buckets.last()?;

    let spreads: Vec<f64> = pairs.iter().map(MatchedPair::spread).collect();

    Some(MarketSummary {
        first_bucket,
        last_bucket,
        bucket_count: buckets.len(),
        matched_pairs: pairs.len(),
        percentiles: side_by_side_percentiles(asks, bids, config),
        spread: summary_stats(&spreads),
        sizes: size_breakdown(asks, bids),
    })
}

fn side_by_side_percentiles(
    asks: &[Offer],
    bids: &[Offer],
    config: &ReportConfig,
) -> Vec<PercentileRow> {
    let at_size = |offers: &[Offer]| -> Vec<f64> {
        offers
            .iter()
            .filter(|o| o.config_size == config.matched_size)
            .map(|o| o.total_price)
            .collect()
    };

    let ask_points = percentile_summary(&at_size(asks), &config.percentile_ranks);
    let bid_points = percentile_summary(&at_size(bids), &config.percentile_ranks);

    match (ask_points, bid_points) {
        (Some(ask_points), Some(bid_points)) => ask_points
            .iter()
            .zip(&bid_points)
            .map(|(a, b)| PercentileRow {
                rank: a.rank,
                ask: a.value,
                bid: b.value,
                spread: a.value - b.value,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn size_breakdown(asks: &[Offer], bids: &[Offer]) -> Vec<SizeBreakdown> {
    let ask_medians = unit_price_median_by_size(asks);
    let bid_medians = unit_price_median_by_size(bids);
    let ask_listings = distinct_listings_by_size(asks);

    let ask_baseline = ask_medians.get(&1).copied();
    let bid_baseline = bid_medians.get(&1).copied();
    let discount = |median: Option<f64>, baseline: Option<f64>| -> Option<f64> {
        let (median, baseline) = (median?, baseline?);
        Some((median - baseline) / baseline * 100.0)
    };

    let sizes: BTreeSet<u32> = ask_medians.keys().chain(bid_medians.keys()).copied().collect();
    sizes
        .into_iter()
        .map(|size| {
            let ask_unit_median = ask_medians.get(&size).copied();
            let bid_unit_median = bid_medians.get(&size).copied();
            SizeBreakdown {
                config_size: size,
                ask_listings: ask_listings.get(&size).copied().unwrap_or(0),
                ask_unit_median,
                bid_unit_median,
                ask_discount_pct: discount(ask_unit_median, ask_baseline),
                bid_discount_pct: discount(bid_unit_median, bid_baseline),
            }
        })
        .collect()
}
