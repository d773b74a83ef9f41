//! Converts raw GEDCOM text into `(level, xref, tag, value)` tuples (C1).
//!
//! Tokenization is hand-rolled byte/char scanning, not a regex: each
//! already-trimmed physical line is scanned exactly once, per the grammar
//!
//! ```text
//! line  := LEVEL SP (XREF SP)? TAG (SP VALUE)?
//! LEVEL := 1+ decimal digits
//! XREF  := '@' [^@]+ '@'
//! TAG   := [A-Za-z_][A-Za-z0-9_]*
//! VALUE := any characters until EOL
//! ```

use crate::error::GedcomError;

/// Maximum accepted length, in bytes, of a single physical line.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// One tokenized physical line, before continuation merging or tree assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct LineToken {
    /// Nesting depth, 0 for top-level records.
    pub level: u8,
    /// The cross-reference identifier, if this line declares one (`@I1@`).
    pub xref: Option<String>,
    /// The tag, e.g. `INDI`, `NAME`, `CONT`.
    pub tag: String,
    /// Everything after the tag, verbatim.
    pub value: String,
    /// The 1-based physical line number this token was read from.
    pub line: u32,
}

/// Detects UTF-8/UTF-16 byte-order marks at the start of a byte stream.
///
/// Returns the decoded text with the BOM stripped and a flag noting whether
/// one was present. ANSEL decoding is out of scope for this helper: the
/// caller is expected to have already transcoded ANSEL sources to UTF-8
/// before calling [`decode`].
#[must_use]
pub fn decode(bytes: &[u8]) -> (String, bool) {
    if let Some(stripped) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return (String::from_utf8_lossy(stripped).into_owned(), true);
    }
    if let Some(stripped) = bytes.strip_prefix(b"\xFF\xFE") {
        let (text, _, _) = encoding_rs::UTF_16LE.decode(stripped);
        return (text.into_owned(), true);
    }
    if let Some(stripped) = bytes.strip_prefix(b"\xFE\xFF") {
        let (text, _, _) = encoding_rs::UTF_16BE.decode(stripped);
        return (text.into_owned(), true);
    }
    (String::from_utf8_lossy(bytes).into_owned(), false)
}

/// Scans already-decoded text into a lazy sequence of [`LineToken`]s.
pub struct Tokenizer<'a> {
    lines: std::str::Lines<'a>,
    line_no: u32,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer over decoded GEDCOM text.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Tokenizer {
            lines: text.lines(),
            line_no: 0,
        }
    }

    /// Reads and tokenizes the next non-empty physical line.
    ///
    /// Returns `Ok(None)` at end of input. Empty lines (after trimming) are
    /// skipped, per the line grammar.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::LineTooLong`] for lines over [`MAX_LINE_LENGTH`]
    /// bytes, and [`GedcomError::MalformedLine`] when the level or tag can't
    /// be scanned.
    pub fn next_line(&mut self) -> Result<Option<LineToken>, GedcomError> {
        loop {
            let Some(raw) = self.lines.next() else {
                return Ok(None);
            };
            self.line_no += 1;

            let trimmed = raw.trim_matches(|c: char| c == '\r' || c.is_whitespace());
            if trimmed.is_empty() {
                continue;
            }

            return tokenize_line(trimmed, self.line_no).map(Some);
        }
    }
}

/// Tokenizes a single already-trimmed physical line.
///
/// Enforcing [`MAX_LINE_LENGTH`] here (rather than only in
/// [`Tokenizer::next_line`]) means every caller of this function — the
/// serial path via `next_line` and the parallel pipeline's worker threads,
/// which call it directly — agrees on what counts as too long.
///
/// # Errors
///
/// Returns [`GedcomError::LineTooLong`] for lines over [`MAX_LINE_LENGTH`]
/// bytes, and [`GedcomError::MalformedLine`] if the level is not a run of
/// decimal digits or no tag can be scanned.
pub fn tokenize_line(line: &str, line_no: u32) -> Result<LineToken, GedcomError> {
    if line.len() > MAX_LINE_LENGTH {
        return Err(GedcomError::LineTooLong { line: line_no });
    }

    let bytes = line.as_bytes();
    let mut pos = 0usize;

    let level_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == level_start {
        return Err(GedcomError::MalformedLine {
            line: line_no,
            text: line.to_string(),
        });
    }
    let level: u8 = line[level_start..pos]
        .parse()
        .map_err(|_| GedcomError::MalformedLine {
            line: line_no,
            text: line.to_string(),
        })?;

    pos = skip_spaces(bytes, pos);

    let mut xref = None;
    if pos < bytes.len() && bytes[pos] == b'@' {
        let start = pos;
        pos += 1;
        while pos < bytes.len() && bytes[pos] != b'@' {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(GedcomError::MalformedLine {
                line: line_no,
                text: line.to_string(),
            });
        }
        pos += 1; // consume closing '@'
        xref = Some(line[start..pos].to_string());
        pos = skip_spaces(bytes, pos);
    }

    let tag_start = pos;
    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if pos == tag_start {
        return Err(GedcomError::MalformedLine {
            line: line_no,
            text: line.to_string(),
        });
    }
    let tag = line[tag_start..pos].to_string();

    pos = skip_spaces(bytes, pos);
    let value = line.get(pos..).unwrap_or("").to_string();

    Ok(LineToken {
        level,
        xref,
        tag,
        value,
        line: line_no,
    })
}

fn skip_spaces(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos] == b' ' {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_line() {
        let tok = tokenize_line("1 NAME John /Doe/", 1).unwrap();
        assert_eq!(tok.level, 1);
        assert_eq!(tok.xref, None);
        assert_eq!(tok.tag, "NAME");
        assert_eq!(tok.value, "John /Doe/");
    }

    #[test]
    fn tokenizes_xref_line() {
        let tok = tokenize_line("0 @I1@ INDI", 1).unwrap();
        assert_eq!(tok.level, 0);
        assert_eq!(tok.xref.as_deref(), Some("@I1@"));
        assert_eq!(tok.tag, "INDI");
        assert_eq!(tok.value, "");
    }

    #[test]
    fn tokenizes_valueless_tag() {
        let tok = tokenize_line("1 BIRT", 1).unwrap();
        assert_eq!(tok.tag, "BIRT");
        assert_eq!(tok.value, "");
    }

    #[test]
    fn rejects_non_digit_level() {
        let err = tokenize_line("A NAME x", 1).unwrap_err();
        assert!(matches!(err, GedcomError::MalformedLine { .. }));
    }

    #[test]
    fn rejects_missing_tag() {
        let err = tokenize_line("1 ", 1).unwrap_err();
        assert!(matches!(err, GedcomError::MalformedLine { .. }));
    }

    #[test]
    fn line_too_long_is_rejected() {
        let mut tokenizer = Tokenizer::new("0 HEAD\n");
        let huge = "a".repeat(MAX_LINE_LENGTH + 1);
        let text = format!("1 NOTE {huge}");
        let err = tokenize_line(&text, 2).unwrap_err();
        assert!(matches!(err, GedcomError::LineTooLong { .. }));
        // keep the Tokenizer constructed above alive for the lint on unused mut
        let _ = tokenizer.next_line();
    }

    #[test]
    fn skips_blank_lines() {
        let mut tokenizer = Tokenizer::new("0 HEAD\n\n\n1 GEDC\n");
        let first = tokenizer.next_line().unwrap().unwrap();
        assert_eq!(first.tag, "HEAD");
        let second = tokenizer.next_line().unwrap().unwrap();
        assert_eq!(second.tag, "GEDC");
        assert!(tokenizer.next_line().unwrap().is_none());
    }

    #[test]
    fn decodes_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"0 HEAD");
        let (text, had_bom) = decode(&bytes);
        assert!(had_bom);
        assert_eq!(text, "0 HEAD");
    }

    #[test]
    fn decodes_plain_utf8_without_bom() {
        let (text, had_bom) = decode(b"0 HEAD");
        assert!(!had_bom);
        assert_eq!(text, "0 HEAD");
    }
}
