//! Utility modules supporting lookup operations.
//!
//! - [`HttpClient`]: HTTP client with user agent and timeouts
//! - [`RetryConfig`]: Configuration for retry logic with exponential backoff
//! - [`with_retry`]: Execute an operation with automatic retry on transient errors

mod http;
mod retry;

pub use http::HttpClient;
pub use retry::{with_retry, RetryConfig};
