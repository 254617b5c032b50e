use std::fs;
use std::path::Path;

use crate::error::TranscriptError;
use crate::types::TranscriptEntry;

/// Read a transcript fully into memory and split it into non-empty lines.
///
/// Invalid UTF-8 is replaced rather than rejected: a writer caught mid-append
/// can leave a truncated multi-byte sequence on the last line.
pub fn read_lines(path: &Path) -> Result<Vec<String>, TranscriptError> {
    let bytes = fs::read(path).map_err(|e| TranscriptError::from_io(path, e))?;
    let content = String::from_utf8_lossy(&bytes);

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Decode one JSONL row. Malformed or partially-written lines yield `None`.
pub fn parse_line(line: &str) -> Option<TranscriptEntry> {
    match serde_json::from_str(line) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::trace!("Skipping unparseable transcript line: {}", e);
            None
        }
    }
}

/// Parse every line, dropping the ones that fail.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<TranscriptEntry> {
    lines.iter().filter_map(|l| parse_line(l.as_ref())).collect()
}

/// Read only the last `n` non-empty lines of a transcript.
pub fn tail_lines(path: &Path, n: usize) -> Result<Vec<String>, TranscriptError> {
    let mut lines = read_lines(path)?;
    let start = lines.len().saturating_sub(n);
    Ok(lines.split_off(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_lines_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"a\":1}}\n\n   \n{{\"b\":2}}\n").unwrap();

        let lines = read_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_read_lines_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(read_lines(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_read_lines_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_lines(&dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, TranscriptError::NotFound(_)));
    }

    #[test]
    fn test_parse_line_rejects_partial_write() {
        assert!(parse_line(r#"{"type":"assistant","uuid":"u1","timest"#).is_none());
        assert!(parse_line("not json at all").is_none());
    }

    #[test]
    fn test_parse_line_unknown_kind_is_other() {
        let entry = parse_line(r#"{"type":"file-history-snapshot","messageId":"m1"}"#).unwrap();
        assert!(matches!(entry, TranscriptEntry::Other));
    }

    #[test]
    fn test_tail_lines_returns_last_n() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..30 {
            writeln!(file, "{{\"n\":{}}}", i).unwrap();
        }

        let tail = tail_lines(file.path(), 20).unwrap();
        assert_eq!(tail.len(), 20);
        assert_eq!(tail[0], "{\"n\":10}");
        assert_eq!(tail[19], "{\"n\":29}");

        let all = tail_lines(file.path(), 100).unwrap();
        assert_eq!(all.len(), 30);
    }
}
