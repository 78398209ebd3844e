//! Utility modules for vqi-builder

pub mod retry;

pub use retry::{retry_with_backoff, RetryPolicy};
