//! BibTeX file I/O adapter.
//!
//! Parsing is delegated to the `biblatex` crate; entries are flattened
//! into [`Record`]s with plain-string field values. Serialization writes
//! one `@type{key, ...}` block per record, fields in insertion order.

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use biblatex::{Bibliography, Chunk, Spanned};

use crate::models::{normalize_whitespace, Record};

/// Fields whose values are whitespace-normalized at parse time, since
/// multi-line BibTeX values otherwise carry embedded newlines into
/// queries and output.
const CLEANED_FIELDS: &[&str] = &["title", "author", "editor", "journal", "booktitle", "series"];

/// Errors from reading or writing bibliography files
#[derive(Debug, thiserror::Error)]
pub enum BibError {
    #[error("failed to read {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),

    #[error("invalid BibTeX: {0}")]
    Parse(String),

    #[error("failed to write {}: {}", .0.display(), .1)]
    Write(PathBuf, #[source] std::io::Error),
}

/// Parse BibTeX source text into records.
pub fn parse(src: &str) -> Result<Vec<Record>, BibError> {
    let bib = Bibliography::parse(src).map_err(|e| BibError::Parse(e.to_string()))?;

    let mut records = Vec::new();
    for entry in bib.iter() {
        let mut record = Record::new(
            entry.key.clone(),
            entry.entry_type.to_bibtex().to_string(),
        );

        for (name, chunks) in &entry.fields {
            let mut value = chunks_to_string(chunks);
            if CLEANED_FIELDS.contains(&name.as_str()) {
                value = normalize_whitespace(&value);
            }
            record.set_field(name.clone(), value);
        }

        records.push(record);
    }

    Ok(records)
}

/// Read and parse a bibliography file. Any failure here is fatal for the
/// run; there is no partial-file recovery.
pub fn read(path: &Path) -> Result<Vec<Record>, BibError> {
    let content = fs::read_to_string(path).map_err(|e| BibError::Read(path.to_path_buf(), e))?;
    parse(&content)
}

/// Serialize records back to BibTeX text.
pub fn to_bibtex_string(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format_record(record));
        out.push('\n');
    }
    out
}

/// Write records to a bibliography file.
///
/// The output is written to a sibling temp file and renamed into place,
/// so a failed write never leaves a partial file behind and an in-place
/// overwrite never corrupts the input.
pub fn write(path: &Path, records: &[Record]) -> Result<(), BibError> {
    let out = to_bibtex_string(records);

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    fs::write(&tmp, out).map_err(|e| BibError::Write(path.to_path_buf(), e))?;

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(BibError::Write(path.to_path_buf(), e));
    }

    Ok(())
}

/// Write selected fields of each record as TSV, header row first.
///
/// The pseudo-fields `key` and `type` select the citation key and entry
/// type. Tabs and newlines inside values are replaced with spaces.
pub fn write_tsv<W: Write>(
    writer: &mut W,
    records: &[Record],
    fields: &[String],
) -> Result<(), std::io::Error> {
    writeln!(writer, "{}", fields.join("\t"))?;

    for record in records {
        let row: Vec<String> = fields
            .iter()
            .map(|f| {
                let value = match f.as_str() {
                    "key" => Some(record.key.as_str()),
                    "type" => Some(record.entry_type.as_str()),
                    name => record.field(name),
                };
                sanitize_tsv(value.unwrap_or(""))
            })
            .collect();
        writeln!(writer, "{}", row.join("\t"))?;
    }

    Ok(())
}

/// Write selected fields of each record to a TSV file.
///
/// The buffered writer is flushed before returning, so a failed write
/// surfaces as an error instead of a silently truncated file.
pub fn write_tsv_file(
    path: &Path,
    records: &[Record],
    fields: &[String],
) -> Result<(), BibError> {
    let file = fs::File::create(path).map_err(|e| BibError::Write(path.to_path_buf(), e))?;
    let mut writer = std::io::BufWriter::new(file);

    write_tsv(&mut writer, records, fields)
        .and_then(|_| writer.flush())
        .map_err(|e| BibError::Write(path.to_path_buf(), e))
}

/// Read a key-list file, one citation key per line. Blank lines are
/// ignored.
pub fn read_key_list(path: &Path) -> Result<Vec<String>, BibError> {
    let content = fs::read_to_string(path).map_err(|e| BibError::Read(path.to_path_buf(), e))?;
    Ok(content
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Keys from the list that have no matching record.
pub fn missing_keys(records: &[Record], keys: &[String]) -> Vec<String> {
    keys.iter()
        .filter(|key| !records.iter().any(|r| &r.key == *key))
        .cloned()
        .collect()
}

/// Drop every record whose key is not in the list.
pub fn retain_keys(records: &mut Vec<Record>, keys: &[String]) {
    records.retain(|r| keys.iter().any(|k| k == &r.key));
}

fn format_record(record: &Record) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "@{}{{{},", record.entry_type, record.key);
    for (name, value) in &record.fields {
        let _ = writeln!(out, "  {} = {{{}}},", name, value);
    }
    out.push('}');
    out
}

fn chunks_to_string(chunks: &[Spanned<Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            Chunk::Normal(s) => s.as_str(),
            Chunk::Verbatim(s) => s.as_str(),
            Chunk::Math(s) => s.as_str(),
        })
        .collect()
}

fn sanitize_tsv(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
@article{vaswani2017,
  title = {Attention Is
           All You Need},
  author = {Vaswani, Ashish and Shazeer, Noam},
  year = {2017},
}

@book{knuth1984,
  title = {The {TeX}book},
  author = {Knuth, Donald E.},
  doi = {10.1/existing},
}
"#;

    #[test]
    fn test_parse_flattens_fields() {
        let records = parse(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.key, "vaswani2017");
        assert_eq!(first.entry_type, "article");
        assert_eq!(first.field("title"), Some("Attention Is All You Need"));
        assert_eq!(first.field("year"), Some("2017"));

        let second = &records[1];
        assert_eq!(second.field("doi"), Some("10.1/existing"));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(parse("@article{broken,\n  title = {unterminated").is_err());
    }

    #[test]
    fn test_round_trip_preserves_entries() {
        let records = parse(SAMPLE).unwrap();
        let serialized = to_bibtex_string(&records);
        let reparsed = parse(&serialized).unwrap();

        assert_eq!(records.len(), reparsed.len());
        for (before, after) in records.iter().zip(reparsed.iter()) {
            assert_eq!(before.key, after.key);
            assert_eq!(before.entry_type, after.entry_type);
            for (name, value) in &before.fields {
                assert_eq!(after.field(name), Some(value.as_str()), "field {}", name);
            }
        }
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bib");

        let records = parse(SAMPLE).unwrap();
        write(&path, &records).unwrap();

        let reread = read(&path).unwrap();
        assert_eq!(reread.len(), records.len());
        assert_eq!(reread[0].key, "vaswani2017");

        // No temp file left behind
        assert!(!dir.path().join("out.bib.tmp").exists());
    }

    #[test]
    fn test_read_missing_file_is_fatal() {
        let err = read(Path::new("/nonexistent/refs.bib")).unwrap_err();
        assert!(matches!(err, BibError::Read(_, _)));
    }

    #[test]
    fn test_write_tsv() {
        let records = parse(SAMPLE).unwrap();
        let fields = vec!["key".to_string(), "type".to_string(), "doi".to_string()];

        let mut out = Vec::new();
        write_tsv(&mut out, &records, &fields).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "key\ttype\tdoi");
        assert_eq!(lines[1], "vaswani2017\tarticle\t");
        assert_eq!(lines[2], "knuth1984\tbook\t10.1/existing");
    }

    #[test]
    fn test_write_tsv_file_flushes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");

        let records = parse(SAMPLE).unwrap();
        let fields = vec!["key".to_string(), "doi".to_string()];
        write_tsv_file(&path, &records, &fields).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "key\tdoi\nvaswani2017\t\nknuth1984\t10.1/existing\n");
    }

    #[test]
    fn test_write_tsv_file_unwritable_destination_is_fatal() {
        let records = parse(SAMPLE).unwrap();
        let fields = vec!["key".to_string()];

        let err = write_tsv_file(
            Path::new("/nonexistent/dir/out.tsv"),
            &records,
            &fields,
        )
        .unwrap_err();
        assert!(matches!(err, BibError::Write(_, _)));
    }

    #[test]
    fn test_key_filtering() {
        let mut records = parse(SAMPLE).unwrap();
        let keys = vec!["knuth1984".to_string(), "absent2020".to_string()];

        assert_eq!(missing_keys(&records, &keys), vec!["absent2020"]);

        retain_keys(&mut records, &keys);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "knuth1984");
    }
}
