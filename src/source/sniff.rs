//! Content sniffing for graph sources whose format is not evident from
//! their location.
//!
//! Both sniffers are heuristics. A failed guess aborts the single load that
//! asked for it, never the process.

use super::{SourceError, SourceResult};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Delimiters tried by [`guess_delimiter`], highest priority first
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Pick the delimiter of a tabular file from a few of its leading lines.
///
/// A candidate qualifies when it occurs in every sampled line and the same
/// number of times in each (a proxy for "every row has the same width").
/// The first qualifying candidate in [`DELIMITER_CANDIDATES`] order wins.
pub fn guess_delimiter<S: AsRef<str>>(lines: &[S]) -> SourceResult<u8> {
    let Some(first) = lines.first() else {
        return Err(SourceError::UndeterminedDelimiter);
    };
    for &candidate in DELIMITER_CANDIDATES.iter() {
        let expected = count_byte(first.as_ref(), candidate);
        if expected == 0 {
            continue;
        }
        if lines
            .iter()
            .all(|line| count_byte(line.as_ref(), candidate) == expected)
        {
            return Ok(candidate);
        }
    }
    Err(SourceError::UndeterminedDelimiter)
}

fn count_byte(line: &str, byte: u8) -> usize {
    line.bytes().filter(|b| *b == byte).count()
}

/// Read up to `max_lines` lines from the start of a file, without their
/// line terminators. Shorter files are returned whole.
pub fn read_leading_lines(path: &Path, max_lines: usize) -> SourceResult<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::with_capacity(max_lines);
    for line in reader.lines().take(max_lines) {
        let line = line?;
        lines.push(line.trim_end_matches('\r').to_string());
    }
    Ok(lines)
}

/// Read a bounded prefix of a file as (lossy) text
pub fn read_prefix(path: &Path, max_bytes: usize) -> SourceResult<String> {
    let mut buf = Vec::with_capacity(max_bytes);
    File::open(path)?
        .take(max_bytes as u64)
        .read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// What a bounded byte prefix reveals about a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentHint {
    /// The prefix contains a `<graphml` element
    GraphMl,
    /// The prefix contains a literal `source,target` header
    EdgeList,
}

/// Inspect a file prefix for a recognisable format marker
pub fn sniff_contents(prefix: &str) -> Option<ContentHint> {
    if prefix.contains("<graphml") {
        Some(ContentHint::GraphMl)
    } else if prefix.contains("source,target") {
        Some(ContentHint::EdgeList)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_guess_comma() {
        let lines = ["src,tgt,weight", "A,B,5", "B,C,7"];
        assert_eq!(guess_delimiter(&lines).unwrap(), b',');
    }

    #[test]
    fn test_each_candidate_detected_alone() {
        for delim in DELIMITER_CANDIDATES {
            let d = delim as char;
            let lines = vec![
                format!("a{d}b{d}c"),
                format!("1{d}2{d}3"),
                format!("4{d}5{d}6"),
            ];
            assert_eq!(guess_delimiter(&lines).unwrap(), delim);
        }
    }

    #[test]
    fn test_priority_order_prefers_comma() {
        // Both ',' and '|' are consistent; ',' comes first
        let lines = ["a,b|c", "1,2|3"];
        assert_eq!(guess_delimiter(&lines).unwrap(), b',');
    }

    #[test]
    fn test_inconsistent_counts_skip_candidate() {
        // ',' appears unevenly (a quoted field with a comma), tab is stable
        let lines = ["name\tnote", "x\ty, z", "p\tq"];
        assert_eq!(guess_delimiter(&lines).unwrap(), b'\t');
    }

    #[test]
    fn test_no_candidate_fails() {
        let lines = ["a b c", "1 2 3"];
        assert!(matches!(
            guess_delimiter(&lines),
            Err(SourceError::UndeterminedDelimiter)
        ));
        let empty: [&str; 0] = [];
        assert!(guess_delimiter(&empty).is_err());
    }

    #[test]
    fn test_candidate_missing_from_one_line_fails() {
        let lines = ["a;b", "1;2", "no delimiter here"];
        assert!(guess_delimiter(&lines).is_err());
    }

    #[test]
    fn test_read_leading_lines_short_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a,b\r\n1,2\n").unwrap();
        let lines = read_leading_lines(file.path(), 5).unwrap();
        assert_eq!(lines, vec!["a,b".to_string(), "1,2".to_string()]);
    }

    #[test]
    fn test_sniff_contents() {
        assert_eq!(
            sniff_contents("<?xml version=\"1.0\"?>\n<graphml xmlns=\"x\">"),
            Some(ContentHint::GraphMl)
        );
        assert_eq!(
            sniff_contents("source,target,weight\na,b,1"),
            Some(ContentHint::EdgeList)
        );
        assert_eq!(sniff_contents("hello world"), None);
    }
}
