//! # bibenrich
//!
//! Enrich BibTeX entries with DOIs fetched from the CrossRef API.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (Record, Candidate, LookupQuery)
//! - [`bib`]: BibTeX file reading, writing, and TSV export
//! - [`sources`]: Metadata lookup sources behind the [`Source`] trait
//! - [`enrich`]: The match-and-enrich engine
//! - [`utils`]: HTTP client and retry helpers
//! - [`config`]: Configuration management

pub mod bib;
pub mod config;
pub mod enrich;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use enrich::{enrich_collection, EnrichOptions, EnrichReport};
pub use models::Record;
pub use sources::{CrossRefSource, Source};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
