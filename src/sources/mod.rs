//! Metadata lookup sources.
//!
//! This module defines the [`Source`] trait implemented by every remote
//! metadata service the tool can query. The production source is
//! [`CrossRefSource`]; tests substitute [`MockSource`] behind the same
//! trait.

mod crossref;
pub mod mock;

pub use crossref::{CrossRefOptions, CrossRefSource};
pub use mock::MockSource;

use async_trait::async_trait;

use crate::models::{Candidate, LookupQuery};

/// Interface for a remote bibliographic metadata service.
///
/// A lookup returns candidates in the service's own relevance order,
/// best match first. An empty vector means the service found nothing;
/// errors are returned for transport and API failures and are degraded
/// to "no candidates" by the caller.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "crossref")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Look up candidate works matching the query
    async fn lookup(&self, query: &LookupQuery) -> Result<Vec<Candidate>, SourceError>;
}

/// Errors that can occur when querying a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error in the service response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
