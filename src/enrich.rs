//! Match-and-enrich engine.
//!
//! Walks the collection in order and, for every record that is missing a
//! DOI, queries the lookup source and attaches the identifier from the
//! best candidate. Only the DOI is ever transferred; no other candidate
//! field is merged, so user-curated data is never clobbered.

use crate::models::{LookupQuery, Record};
use crate::sources::Source;

/// Engine options
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrichOptions {
    /// Re-fetch and replace DOIs on records that already carry one
    pub overwrite_doi: bool,
}

/// Per-run outcome counters, reported in the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Records processed
    pub total: usize,
    /// Records that received a DOI
    pub enriched: usize,
    /// Records skipped because they already had a DOI
    pub skipped_existing: usize,
    /// Records skipped because they had no usable title
    pub skipped_untitled: usize,
    /// Records looked up but left unchanged (no candidate or no usable DOI)
    pub unmatched: usize,
    /// Records whose lookup failed; left unchanged
    pub failed: usize,
}

/// Enrich every record in the collection, in input order.
///
/// Lookup failures are logged and degrade to "no match" for that record;
/// they never abort the rest of the run.
pub async fn enrich_collection(
    source: &dyn Source,
    records: &mut [Record],
    options: EnrichOptions,
) -> EnrichReport {
    let mut report = EnrichReport {
        total: records.len(),
        ..Default::default()
    };

    for record in records.iter_mut() {
        if record.has_field("doi") && !options.overwrite_doi {
            tracing::debug!(key = %record.key, "already has a DOI, skipping");
            report.skipped_existing += 1;
            continue;
        }

        let query = match LookupQuery::from_record(record) {
            Some(query) => query,
            None => {
                tracing::debug!(key = %record.key, "no title to query with, skipping");
                report.skipped_untitled += 1;
                continue;
            }
        };

        let candidates = match source.lookup(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(key = %record.key, source = source.id(), "lookup failed: {}", e);
                report.failed += 1;
                continue;
            }
        };

        // Trust the service's relevance ranking: the first candidate is
        // the match, with no local similarity check.
        let doi = candidates.first().and_then(|c| c.usable_doi());

        match doi {
            Some(doi) => {
                if let Some(existing) = record.field("doi") {
                    if !existing.eq_ignore_ascii_case(doi) {
                        tracing::debug!(
                            key = %record.key,
                            existing,
                            fetched = doi,
                            "DOI mismatch, overwriting"
                        );
                    }
                }
                record.set_field("doi", doi.to_string());
                tracing::info!(key = %record.key, doi, "enriched");
                report.enriched += 1;
            }
            None => {
                tracing::debug!(key = %record.key, "no candidate with a usable DOI");
                report.unmatched += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::{make_candidate, MockSource};
    use crate::sources::SourceError;

    fn record_with_title(key: &str, title: &str) -> Record {
        let mut record = Record::new(key, "article");
        record.set_field("title", title);
        record
    }

    #[tokio::test]
    async fn test_attaches_doi_from_first_candidate() {
        let source = MockSource::new();
        source.push_candidates(vec![
            make_candidate(
                "Attention Is All You Need",
                Some("10.48550/arXiv.1706.03762"),
            ),
            make_candidate("Attention is not all you need", Some("10.9999/other")),
        ]);

        let mut record = record_with_title("vaswani2017", "Attention Is All You Need");
        record.set_field("author", "Vaswani, Ashish and Shazeer, Noam");
        record.set_field("year", "2017");
        let before_fields = record.fields.clone();

        let mut records = vec![record];
        let report = enrich_collection(&source, &mut records, EnrichOptions::default()).await;

        assert_eq!(report.enriched, 1);
        assert_eq!(
            records[0].field("doi"),
            Some("10.48550/arXiv.1706.03762")
        );

        // Only the doi field may change
        for (name, value) in &before_fields {
            assert_eq!(records[0].field(name), Some(value.as_str()));
        }

        // Query carried title and first-author surname
        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].title, "Attention Is All You Need");
        assert_eq!(queries[0].author.as_deref(), Some("Vaswani"));
    }

    #[tokio::test]
    async fn test_skips_record_with_existing_doi() {
        let source = MockSource::new();

        let mut record = record_with_title("knuth1984", "The TeXbook");
        record.set_field("doi", "10.1/existing");

        let mut records = vec![record];
        let report = enrich_collection(&source, &mut records, EnrichOptions::default()).await;

        assert_eq!(report.skipped_existing, 1);
        assert_eq!(records[0].field("doi"), Some("10.1/existing"));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_overwrite_mode_replaces_existing_doi() {
        let source = MockSource::new();
        source.push_candidates(vec![make_candidate("The TeXbook", Some("10.2/fresh"))]);

        let mut record = record_with_title("knuth1984", "The TeXbook");
        record.set_field("doi", "10.1/existing");

        let mut records = vec![record];
        let options = EnrichOptions {
            overwrite_doi: true,
        };
        let report = enrich_collection(&source, &mut records, options).await;

        assert_eq!(report.enriched, 1);
        assert_eq!(records[0].field("doi"), Some("10.2/fresh"));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_skips_record_without_title() {
        let source = MockSource::new();

        let mut record = Record::new("untitled", "misc");
        record.set_field("author", "Doe, Jane");

        let mut records = vec![record];
        let report = enrich_collection(&source, &mut records, EnrichOptions::default()).await;

        assert_eq!(report.skipped_untitled, 1);
        assert!(!records[0].has_field("doi"));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_candidate_list_is_not_an_error() {
        let source = MockSource::new();
        source.push_candidates(Vec::new());

        let mut records = vec![record_with_title("r1", "Some Title")];
        let report = enrich_collection(&source, &mut records, EnrichOptions::default()).await;

        assert_eq!(report.unmatched, 1);
        assert_eq!(report.failed, 0);
        assert!(!records[0].has_field("doi"));
    }

    #[tokio::test]
    async fn test_candidate_without_doi_leaves_record_unchanged() {
        let source = MockSource::new();
        source.push_candidates(vec![make_candidate("Some Title", None)]);

        let mut records = vec![record_with_title("r1", "Some Title")];
        let report = enrich_collection(&source, &mut records, EnrichOptions::default()).await;

        assert_eq!(report.unmatched, 1);
        assert!(!records[0].has_field("doi"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_isolated() {
        let source = MockSource::new();
        source.push_candidates(vec![make_candidate("First", Some("10.1/first"))]);
        source.push_error(SourceError::Network("connection refused".into()));
        source.push_candidates(vec![make_candidate("Third", Some("10.3/third"))]);

        let mut records = vec![
            record_with_title("r1", "First"),
            record_with_title("r2", "Second"),
            record_with_title("r3", "Third"),
        ];
        let report = enrich_collection(&source, &mut records, EnrichOptions::default()).await;

        assert_eq!(report.enriched, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(records[0].field("doi"), Some("10.1/first"));
        assert!(!records[1].has_field("doi"));
        assert_eq!(records[2].field("doi"), Some("10.3/third"));
    }

    #[tokio::test]
    async fn test_idempotent_on_second_pass() {
        let source = MockSource::new();
        source.push_candidates(vec![make_candidate("T", Some("10.1/t"))]);

        let mut records = vec![record_with_title("r1", "T")];
        enrich_collection(&source, &mut records, EnrichOptions::default()).await;
        let after_first = records.clone();

        let report = enrich_collection(&source, &mut records, EnrichOptions::default()).await;

        assert_eq!(report.enriched, 0);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(records, after_first);
        assert_eq!(source.call_count(), 1);
    }
}
