//! Output formatting for streamed entries.
//!
//! Provides functions to render an [`Entry`] as a JSON line or as a
//! checksum-style text line, and to write a whole stream to any writer.

use crate::{Entry, SyncerError};
use std::io::{self, Write};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// `<hash>  <path>` for files, `<path>/` for directories, a dashed
    /// placeholder hash for symlinks and special files.
    Text,
}

/// Formats one entry into a string without a trailing newline.
///
/// # Errors
///
/// Returns the serializer error if JSON encoding fails.
pub fn format_entry(
    entry: &Entry,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => format_json(entry, pretty),
        OutputFormat::Text => Ok(format_text(entry)),
    }
}

/// Writes every successful item to `out` and every failure to `err_out`.
///
/// Returns the number of failures seen. Stops early only if writing fails.
///
/// # Errors
///
/// Returns an I/O error if either writer fails.
pub fn write_stream<I, W, E>(
    items: I,
    format: OutputFormat,
    pretty: bool,
    mut out: W,
    mut err_out: E,
) -> io::Result<usize>
where
    I: IntoIterator<Item = Result<Entry, SyncerError>>,
    W: Write,
    E: Write,
{
    let mut failures = 0;
    for item in items {
        match item {
            Ok(entry) => {
                let line = format_entry(&entry, format, pretty).map_err(io::Error::other)?;
                writeln!(out, "{}", line)?;
            }
            Err(e) => {
                failures += 1;
                writeln!(err_out, "Error: {}", e)?;
            }
        }
    }
    out.flush()?;
    Ok(failures)
}

// ----------------------- Internal formatting -----------------------

fn format_json(entry: &Entry, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(entry)
    } else {
        serde_json::to_string(entry)
    }
}

fn format_text(entry: &Entry) -> String {
    let path = entry.path();
    match entry.content_hash() {
        _ if entry.is_directory() => format!("{}/", path.display()),
        Some(hash) => format!("{}  {}", hash, path.display()),
        None => format!("{}  {}", "-".repeat(64), path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CancellationToken;
    use crate::hasher::hash_file;
    use crate::options::HashAlgorithm;
    use std::fs;
    use tempfile::tempdir;

    fn hashed_entry(dir: &std::path::Path) -> Entry {
        let path = dir.join("a.txt");
        fs::write(&path, "hi").unwrap();
        let mut entry = Entry::from_metadata("a.txt".into(), dir, &fs::metadata(&path).unwrap());
        let hash = hash_file(&path, HashAlgorithm::Sha256, &CancellationToken::new()).unwrap();
        entry.set_content_hash(hash);
        entry
    }

    #[test]
    fn text_line_is_checksum_style() {
        let dir = tempdir().unwrap();
        let line = format_entry(&hashed_entry(dir.path()), OutputFormat::Text, false).unwrap();
        assert!(line.starts_with("8f434346648f6b96"));
        assert!(line.ends_with("a.txt"));
    }

    #[test]
    fn json_line_carries_hash() {
        let dir = tempdir().unwrap();
        let line = format_entry(&hashed_entry(dir.path()), OutputFormat::Json, false).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["name"], "a.txt");
        assert_eq!(value["size"], 2);
        assert!(value["content_hash"].as_str().unwrap().starts_with("8f43"));
    }

    #[test]
    fn stream_failures_are_counted_and_reported() {
        let dir = tempdir().unwrap();
        let items = vec![
            Ok(hashed_entry(dir.path())),
            Err(SyncerError::InvalidArgument("boom".into())),
        ];
        let mut out = Vec::new();
        let mut err = Vec::new();
        let failures = write_stream(items, OutputFormat::Text, false, &mut out, &mut err).unwrap();
        assert_eq!(failures, 1);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
        assert!(String::from_utf8(err).unwrap().contains("boom"));
    }
}
