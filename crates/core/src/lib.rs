//! Core types and configuration for the GPU rental market pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Order-book observation types (raw rows, typed observations, offers)
//! - Time bucket alignment key
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
