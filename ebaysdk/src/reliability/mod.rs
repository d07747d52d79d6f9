//! Reliability patterns for API calls.
//!
//! Provides opt-in retry with exponential backoff for transient failures.

mod retry;

pub use retry::{RetryPolicy, is_retryable, retry_with_backoff};
