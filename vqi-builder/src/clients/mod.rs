//! HTTP clients for remote venue-metric sources

pub mod clarivate;

pub use clarivate::{ClarivateClient, EDITIONS};
