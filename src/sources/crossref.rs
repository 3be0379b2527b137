//! CrossRef lookup source.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{Candidate, LookupQuery};
use crate::sources::{Source, SourceError};
use crate::utils::{with_retry, HttpClient, RetryConfig};

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// Options for constructing a [`CrossRefSource`].
#[derive(Debug, Clone)]
pub struct CrossRefOptions {
    /// Contact address for the CrossRef polite pool, appended to the
    /// User-Agent when set
    pub mailto: Option<String>,

    /// Number of candidate rows to request per query
    pub rows: usize,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retry behavior for transient failures
    pub retry: RetryConfig,
}

impl Default for CrossRefOptions {
    fn default() -> Self {
        Self {
            mailto: None,
            rows: 3,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

/// CrossRef lookup source
///
/// Queries the CrossRef REST API by bibliographic title (and optionally
/// first-author surname) and returns candidates in CrossRef's own
/// relevance order.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: Arc<HttpClient>,
    rows: usize,
    retry: RetryConfig,
}

impl CrossRefSource {
    pub fn new(options: CrossRefOptions) -> Result<Self, SourceError> {
        let user_agent = match &options.mailto {
            Some(addr) => format!(
                "{}/{} (mailto:{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                addr
            ),
            None => format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        };

        Ok(Self {
            client: Arc::new(HttpClient::new(&user_agent, options.timeout)?),
            rows: options.rows.max(1),
            retry: options.retry,
        })
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Vec<Candidate>, SourceError> {
        let mut url = format!(
            "{}/works?query.bibliographic={}&rows={}",
            CROSSREF_API_BASE,
            urlencoding::encode(&query.title),
            self.rows
        );

        if let Some(author) = &query.author {
            url = format!("{}&query.author={}", url, urlencoding::encode(author));
        }

        // Clone values for retry closure
        let client = Arc::clone(&self.client);
        let url_for_retry = url.clone();

        let response = with_retry(self.retry, || {
            let client = Arc::clone(&client);
            let url = url_for_retry.clone();
            async move {
                let response = client.get(&url).send().await.map_err(|e| {
                    SourceError::Network(format!("Failed to query CrossRef: {}", e))
                })?;

                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(SourceError::RateLimit);
                }
                if !status.is_success() {
                    return Err(SourceError::Api(format!(
                        "CrossRef API returned status: {}",
                        status
                    )));
                }

                Ok(response)
            }
        })
        .await?;

        let data: CRResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(candidates_from_response(data))
    }
}

fn candidates_from_response(data: CRResponse) -> Vec<Candidate> {
    data.message
        .items
        .into_iter()
        .map(|item| {
            let title = item.title.into_iter().next().unwrap_or_default();

            let authors = item
                .author
                .iter()
                .filter_map(|a| a.display_name())
                .collect();

            Candidate {
                title,
                authors,
                doi: item.doi,
            }
        })
        .collect()
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
struct CRItem {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    author: Vec<CRAuthor>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
}

impl CRAuthor {
    fn display_name(&self) -> Option<String> {
        match (&self.given, &self.family) {
            (Some(given), Some(family)) => Some(format!("{} {}", given, family)),
            (None, Some(family)) => Some(family.clone()),
            (Some(given), None) => Some(given.clone()),
            (None, None) => None,
        }
    }
}
