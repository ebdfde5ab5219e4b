//! Data ingestion for the GPU rental market pipeline.
//!
//! This crate handles:
//! - Loading raw capture rows into typed observations (skip-and-count)
//! - Time alignment (flooring timestamps to minute buckets)
//! - Normalization (allow-list filter, first-seen dedup, per-unit pricing)

pub mod aligner;
pub mod loader;
pub mod normalizer;

pub use aligner::align;
pub use loader::{load, load_side, LoadStats, LoadedBook, SideLoad};
pub use normalizer::{normalize, Normalized, NormalizeStats};
