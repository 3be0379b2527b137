//! Core data models for bibliography records and lookup results.

mod candidate;
mod record;

pub use candidate::{normalize_whitespace, Candidate, LookupQuery};
pub use record::Record;
