//! # VQI Common Library
//!
//! Shared code for the venue quality index tools:
//! - Error and result types
//! - TOML configuration loading and path resolution
//! - Timestamp helpers used in build metadata

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
