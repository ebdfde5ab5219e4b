//! Grouped statistics over offers and matched pairs.
//!
//! Explicit grouping (key → records) followed by explicit statistics, all
//! pure functions. Output maps are `BTreeMap`s so iteration order is
//! deterministic; empty groups never appear (they are omitted, never
//! emitted as NaN rows).

use crate::percentile::{percentile_summary, summary_stats, PercentilePoint, SummaryStats};
use gpumarket_core::{Error, MatchedPair, Offer, Result, TimeBucket};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Supply/liquidity counters for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyCount {
    /// Observation rows in the group.
    pub observations: usize,
    /// Distinct listings (by listing id; a listing recurs across buckets).
    pub distinct_listings: usize,
}

/// Group offers by time bucket, preserving input order within groups.
pub fn group_by_bucket(offers: &[Offer]) -> BTreeMap<TimeBucket, Vec<&Offer>> {
    let mut groups: BTreeMap<TimeBucket, Vec<&Offer>> = BTreeMap::new();
    for offer in offers {
        groups.entry(offer.bucket).or_default().push(offer);
    }
    groups
}

/// Per-bucket percentile summary of total price.
pub fn price_percentiles_by_bucket(
    offers: &[Offer],
    ranks: &[f64],
) -> BTreeMap<TimeBucket, Vec<PercentilePoint>> {
    group_by_bucket(offers)
        .into_iter()
        .filter_map(|(bucket, group)| {
            let values: Vec<f64> = group.iter().map(|o| o.total_price).collect();
            percentile_summary(&values, ranks).map(|points| (bucket, points))
        })
        .collect()
}

/// Per-bucket percentile summary of matched-pair spread.
pub fn spread_percentiles_by_bucket(
    pairs: &[MatchedPair],
    ranks: &[f64],
) -> BTreeMap<TimeBucket, Vec<PercentilePoint>> {
    group_pairs_by_bucket(pairs)
        .into_iter()
        .filter_map(|(bucket, spreads)| {
            percentile_summary(&spreads, ranks).map(|points| (bucket, points))
        })
        .collect()
}

/// Per-bucket median/mean/std of matched-pair spread.
pub fn spread_summary_by_bucket(pairs: &[MatchedPair]) -> BTreeMap<TimeBucket, SummaryStats> {
    group_pairs_by_bucket(pairs)
        .into_iter()
        .filter_map(|(bucket, spreads)| summary_stats(&spreads).map(|stats| (bucket, stats)))
        .collect()
}

/// Per-bucket supply counters.
pub fn supply_by_bucket(offers: &[Offer]) -> BTreeMap<TimeBucket, SupplyCount> {
    group_by_bucket(offers)
        .into_iter()
        .map(|(bucket, group)| {
            let distinct: HashSet<&str> =
                group.iter().map(|o| o.listing_id.as_str()).collect();
            (
                bucket,
                SupplyCount {
                    observations: group.len(),
                    distinct_listings: distinct.len(),
                },
            )
        })
        .collect()
}

/// Median per-GPU price for each configuration size present.
pub fn unit_price_median_by_size(offers: &[Offer]) -> BTreeMap<u32, f64> {
    let mut by_size: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for offer in offers {
        by_size.entry(offer.config_size).or_default().push(offer.unit_price);
    }
    by_size
        .into_iter()
        .filter_map(|(size, values)| {
            summary_stats(&values).map(|stats| (size, stats.median))
        })
        .collect()
}

/// Median per-GPU price per time bucket, one time series for each
/// configuration size present.
///
/// Buckets a size never appears in are omitted from that size's series.
pub fn unit_price_median_by_size_and_bucket(
    offers: &[Offer],
) -> BTreeMap<u32, BTreeMap<TimeBucket, f64>> {
    let mut grouped: BTreeMap<u32, BTreeMap<TimeBucket, Vec<f64>>> = BTreeMap::new();
    for offer in offers {
        grouped
            .entry(offer.config_size)
            .or_default()
            .entry(offer.bucket)
            .or_default()
            .push(offer.unit_price);
    }
    grouped
        .into_iter()
        .map(|(size, buckets)| {
            let series = buckets
                .into_iter()
                .filter_map(|(bucket, values)| {
                    summary_stats(&values).map(|stats| (bucket, stats.median))
                })
                .collect();
            (size, series)
        })
        .collect()
}

/// Distinct listing counts for each configuration size present.
pub fn distinct_listings_by_size(offers: &[Offer]) -> BTreeMap<u32, usize> {
    let mut by_size: BTreeMap<u32, HashSet<&str>> = BTreeMap::new();
    for offer in offers {
        by_size
            .entry(offer.config_size)
            .or_default()
            .insert(offer.listing_id.as_str());
    }
    by_size
        .into_iter()
        .map(|(size, listings)| (size, listings.len()))
        .collect()
}

/// Per-unit discount vs the size-1 baseline, as a percentage, for every
/// configuration size present (size 1 itself reports 0.0).
///
/// `(median(unit | size=n) - median(unit | size=1)) / median(unit | size=1) * 100`.
/// Fails with [`Error::NoBaseline`] when no size-1 observations exist.
pub fn discounts_by_size(offers: &[Offer]) -> Result<BTreeMap<u32, f64>> {
    let medians = unit_price_median_by_size(offers);
    let baseline = *medians.get(&1).ok_or(Error::NoBaseline)?;

    Ok(medians
        .into_iter()
        .map(|(size, median)| (size, (median - baseline) / baseline * 100.0))
        .collect())
}

/// Per-unit discount vs the size-1 baseline for one configuration size.
///
/// `Ok(None)` when the size has no observations; [`Error::NoBaseline`]
/// when size-1 data is missing entirely.
pub fn discount_vs_baseline(offers: &[Offer], size: u32) -> Result<Option<f64>> {
    let discounts = discounts_by_size(offers)?;
    Ok(discounts.get(&size).copied())
}

fn group_pairs_by_bucket(pairs: &[MatchedPair]) -> BTreeMap<TimeBucket, Vec<f64>> {
    let mut groups: BTreeMap<TimeBucket, Vec<f64>> = BTreeMap::new();
    for pair in pairs {
        groups.entry(pair.bucket()).or_default().push(pair.spread());
    }
    groups
}
