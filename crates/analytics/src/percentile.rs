//! Empirical percentiles via interpolated order statistics.
//!
//! Linear interpolation between order statistics, the conventional default
//! quantile method (what pandas/NumPy report unless told otherwise).

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// A single percentile rank (percent, 0-100) and its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    pub rank: f64,
    pub value: f64,
}

/// Central tendency and dispersion for one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of observations.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Interpolated median.
    pub median: f64,
    /// Sample standard deviation; 0.0 for a single observation.
    pub std_dev: f64,
}

/// Sort a copy of the values ascending under a total order.
fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|v| OrderedFloat(*v));
    sorted
}

/// Interpolated quantile of an ascending, non-empty slice. `q` in [0, 1].
fn interpolate(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    if n == 1 {
        // A single observation answers every rank.
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Empirical quantile of an ascending slice. `q` in [0, 1].
///
/// `sorted` must already be ascending; results are unspecified
/// otherwise. [`percentile_summary`] sorts internally for callers
/// holding unordered values.
///
/// Returns `None` on empty input; never NaN.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(interpolate(sorted, q))
}

/// Percentile summary of a group at the given ranks (percent, 0-100).
///
/// Returns `None` on empty input. Output is monotone in rank by
/// construction when the ranks are ascending.
pub fn percentile_summary(values: &[f64], ranks: &[f64]) -> Option<Vec<PercentilePoint>> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    Some(
        ranks
            .iter()
            .map(|&rank| PercentilePoint {
                rank,
                value: interpolate(&sorted, rank / 100.0),
            })
            .collect(),
    )
}

/// Count, mean, median, and sample standard deviation of a group.
///
/// Returns `None` on empty input.
pub fn summary_stats(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let std_dev = if values.len() > 1 {
        values.std_dev()
    } else {
        0.0
    };
    Some(SummaryStats {
        count: values.len(),
        mean: values.mean(),
        median: interpolate(&sorted, 0.5),
        std_dev,
    })
}
