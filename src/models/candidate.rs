//! Lookup query and candidate models.

use serde::{Deserialize, Serialize};

use crate::models::Record;

/// A query against a remote metadata service, built from one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    /// Title to match on, whitespace-normalized
    pub title: String,

    /// First author's surname, when the record has an author field
    pub author: Option<String>,
}

impl LookupQuery {
    /// Build a query from a record. Returns `None` when the record has no
    /// usable title to match on.
    pub fn from_record(record: &Record) -> Option<Self> {
        let title = normalize_whitespace(record.field("title")?);
        if title.is_empty() {
            return None;
        }

        Some(Self {
            title,
            author: record.first_author_surname(),
        })
    }
}

/// A single match returned by the lookup service for a query.
///
/// Candidates keep the service's relevance order; the first one is the
/// best match. They exist only for the duration of one lookup and are
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Work title as reported by the service
    pub title: String,

    /// Author names, in publication order
    pub authors: Vec<String>,

    /// Persistent identifier, when the service reports one
    pub doi: Option<String>,
}

impl Candidate {
    /// The candidate's DOI, if present and non-empty
    pub fn usable_doi(&self) -> Option<&str> {
        self.doi
            .as_deref()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
    }
}

/// Collapse runs of whitespace (including newlines carried over from
/// multi-line BibTeX values) into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_record() {
        let mut record = Record::new("vaswani2017", "article");
        record.set_field("title", "Attention Is\n  All You Need");
        record.set_field("author", "Vaswani, Ashish and Shazeer, Noam");

        let query = LookupQuery::from_record(&record).unwrap();
        assert_eq!(query.title, "Attention Is All You Need");
        assert_eq!(query.author.as_deref(), Some("Vaswani"));
    }

    #[test]
    fn test_query_requires_title() {
        let mut record = Record::new("k", "article");
        assert!(LookupQuery::from_record(&record).is_none());

        record.set_field("title", "  ");
        assert!(LookupQuery::from_record(&record).is_none());
    }

    #[test]
    fn test_usable_doi() {
        let mut candidate = Candidate {
            title: "T".into(),
            authors: vec![],
            doi: None,
        };
        assert_eq!(candidate.usable_doi(), None);

        candidate.doi = Some("  ".into());
        assert_eq!(candidate.usable_doi(), None);

        candidate.doi = Some("10.1000/xyz".into());
        assert_eq!(candidate.usable_doi(), Some("10.1000/xyz"));
    }
}
