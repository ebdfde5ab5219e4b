//! Configuration structures for the GPU rental market pipeline.
//!
//! All knobs are explicit values passed into the pipeline at call time;
//! there is no process-wide state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Time alignment configuration.
    pub alignment: AlignmentConfig,
    /// Normalizer configuration.
    pub normalizer: NormalizerConfig,
    /// Report/aggregation configuration.
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alignment: AlignmentConfig::default(),
            normalizer: NormalizerConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.alignment.validate()?;
        self.normalizer.validate()?;
        self.report.validate()
    }
}

/// Time alignment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Bucket width in seconds. Policy constant, not a derived value:
    /// one minute absorbs the capture skew between the ask and bid passes.
    pub bucket_seconds: i64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self { bucket_seconds: 60 }
    }
}

impl AlignmentConfig {
    /// Check the bucket width is usable.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_seconds <= 0 {
            return Err(Error::invalid_config(format!(
                "bucket_seconds must be positive, got {}",
                self.bucket_seconds
            )));
        }
        Ok(())
    }
}

/// Normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Supported configuration sizes; anything else is dropped as noise.
    pub allowed_sizes: Vec<u32>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            allowed_sizes: vec![1, 2, 4, 8],
        }
    }
}

impl NormalizerConfig {
    /// Check the allow-list is usable.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_sizes.is_empty() {
            return Err(Error::invalid_config("allowed_sizes must not be empty"));
        }
        if self.allowed_sizes.contains(&0) {
            return Err(Error::invalid_config("allowed_sizes must not contain 0"));
        }
        Ok(())
    }
}

/// Report/aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Percentile ranks (percent, 0-100) reported for price and spread
    /// distributions, in ascending order.
    pub percentile_ranks: Vec<f64>,
    /// Configuration size used for the matched-pair spread analysis.
    /// Single-GPU listings are the apples-to-apples baseline.
    pub matched_size: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            percentile_ranks: vec![1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 95.0],
            matched_size: 1,
        }
    }
}

impl ReportConfig {
    /// Check ranks are finite, in range, and ascending.
    pub fn validate(&self) -> Result<()> {
        if self.percentile_ranks.is_empty() {
            return Err(Error::invalid_config("percentile_ranks must not be empty"));
        }
        for pair in self.percentile_ranks.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::invalid_config(
                    "percentile_ranks must be strictly ascending",
                ));
            }
        }
        for &rank in &self.percentile_ranks {
            if !rank.is_finite() || !(0.0..=100.0).contains(&rank) {
                return Err(Error::invalid_config(format!(
                    "percentile rank {rank} outside [0, 100]"
                )));
            }
        }
        if self.matched_size == 0 {
            return Err(Error::invalid_config("matched_size must be positive"));
        }
        Ok(())
    }
}
