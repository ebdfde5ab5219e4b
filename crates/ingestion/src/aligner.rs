//! Time alignment: floor capture timestamps to a shared bucket boundary.
//!
//! The ask and bid snapshots are captured by separate passes
//! milliseconds-to-seconds apart; an exact-timestamp join would match
//! almost nothing. Flooring both streams to the same granularity absorbs
//! the skew before matching.

use gpumarket_core::config::AlignmentConfig;
use gpumarket_core::{AlignedObservation, Observation, Result, TimeBucket};

/// Assign each observation a time bucket, preserving input order.
///
/// Runs before normalization: the dedup key contains the bucket.
pub fn align(
    observations: Vec<Observation>,
    config: &AlignmentConfig,
) -> Result<Vec<AlignedObservation>> {
    config.validate()?;
    let width = config.bucket_seconds;

    Ok(observations
        .into_iter()
        .map(|obs| AlignedObservation {
            bucket: TimeBucket::floor(obs.observed_at, width),
            obs,
        })
        .collect())
}
