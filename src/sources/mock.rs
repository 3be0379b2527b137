//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::{Candidate, LookupQuery};
use crate::sources::{Source, SourceError};

/// A mock source that replays scripted responses.
///
/// Responses are consumed in the order they were pushed; once the script
/// is exhausted, further lookups return an empty candidate list. Every
/// received query is recorded so tests can assert which records actually
/// triggered a lookup.
#[derive(Debug, Default)]
pub struct MockSource {
    responses: Mutex<VecDeque<Result<Vec<Candidate>, SourceError>>>,
    queries: Mutex<Vec<LookupQuery>>,
}

impl MockSource {
    /// Create a new mock source with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_candidates(&self, candidates: Vec<Candidate>) {
        self.responses.lock().unwrap().push_back(Ok(candidates));
    }

    /// Queue an error response.
    pub fn push_error(&self, error: SourceError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Queries received so far, in call order.
    pub fn queries(&self) -> Vec<LookupQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Number of lookups performed against this source.
    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Vec<Candidate>, SourceError> {
        self.queries.lock().unwrap().push(query.clone());

        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(Vec::new()),
        }
    }
}

/// Helper to build a candidate for tests.
pub fn make_candidate(title: &str, doi: Option<&str>) -> Candidate {
    Candidate {
        title: title.to_string(),
        authors: Vec::new(),
        doi: doi.map(|d| d.to_string()),
    }
}
