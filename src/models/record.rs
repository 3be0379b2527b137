//! Record model representing a single bibliography entry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single BibTeX entry: citation key, entry type, and an
/// insertion-ordered field map.
///
/// Field order is preserved from parse to serialization so that repeated
/// load/save cycles produce deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Citation key, unique within the collection
    pub key: String,

    /// BibTeX entry type (article, book, inproceedings, ...)
    pub entry_type: String,

    /// Field name -> value, in insertion order
    pub fields: IndexMap<String, String>,
}

impl Record {
    /// Create a new record with no fields
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: IndexMap::new(),
        }
    }

    /// Whether the record carries a non-empty value for `name`
    pub fn has_field(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    /// Field value, if present
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    /// Insert or overwrite a field. Values are pass-through strings,
    /// no validation of content.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Surname of the first author, parsed from the BibTeX `author` field.
    ///
    /// Handles both "Last, First and Last2, First2" and "First Last and
    /// First2 Last2" forms. Returns `None` when the field is absent or
    /// empty.
    pub fn first_author_surname(&self) -> Option<String> {
        let authors = self.field("author")?;
        let first = authors.split(" and ").next()?.trim();
        if first.is_empty() {
            return None;
        }

        let surname = match first.split_once(',') {
            Some((last, _)) => last.trim(),
            None => first.split_whitespace().next_back()?,
        };

        if surname.is_empty() {
            None
        } else {
            Some(surname.to_string())
        }
    }
}
