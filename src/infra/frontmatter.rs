//! Frontmatter codec for note files: a YAML header followed by the raw content.

use crate::domain::Note;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of parsing a note file.
///
/// Timestamps are optional because hand-written or imported files may not
/// carry them; the storage backend fills them in from file metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub body: String,
}

/// Errors during frontmatter parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing closing frontmatter delimiter '---'")]
    MissingClosingDelimiter,

    #[error("invalid YAML in frontmatter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// The YAML header as written to disk. Field order here is the on-disk order.
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<DateTime<Utc>>,
}

/// Parses note file text.
///
/// # Format
/// ```text
/// ---
/// title: Note Title
/// tags:
/// - rust
/// created: 2024-01-15T10:30:00Z
/// modified: 2024-01-15T10:30:00Z
/// ---
/// Body content here...
/// ```
///
/// Text that does not open with a `---` line has no header: the whole text
/// is the body and every header field is absent.
///
/// # Errors
///
/// Returns `ParseError` if a header is opened but never closed, or if the
/// YAML between the delimiters is invalid.
pub fn parse(content: &str) -> Result<ParsedNote, ParseError> {
    let after_opening = if content.starts_with("---\r\n") {
        5
    } else if content.starts_with("---\n") {
        4
    } else if content == "---" {
        return Err(ParseError::MissingClosingDelimiter);
    } else {
        return Ok(ParsedNote {
            title: None,
            tags: Vec::new(),
            created: None,
            modified: None,
            body: content.to_string(),
        });
    };

    let yaml_and_rest = &content[after_opening..];
    let closing_pos = find_closing_delimiter(yaml_and_rest)?;
    let yaml_content = &yaml_and_rest[..closing_pos];

    let after_closing = &yaml_and_rest[closing_pos..];
    let body_start = if after_closing.starts_with("---\r\n") {
        closing_pos + 5
    } else if after_closing.starts_with("---\n") {
        closing_pos + 4
    } else {
        closing_pos + 3
    };
    let body = yaml_and_rest.get(body_start..).unwrap_or_default().to_string();

    // An empty header deserializes as YAML null, not an empty mapping.
    let header: Header = if yaml_content.trim().is_empty() {
        Header {
            title: None,
            tags: Vec::new(),
            created: None,
            modified: None,
        }
    } else {
        serde_yaml::from_str(yaml_content)?
    };

    Ok(ParsedNote {
        title: header.title,
        tags: header.tags,
        created: header.created,
        modified: header.modified,
        body,
    })
}

/// Serializes a note to file text with a YAML header.
pub fn serialize(note: &Note) -> String {
    let header = Header {
        title: Some(note.title().to_string()),
        tags: note.tags().to_vec(),
        created: Some(note.created()),
        modified: Some(note.modified()),
    };
    let yaml = serde_yaml::to_string(&header).expect("header serialization is infallible");
    format!("---\n{}---\n{}", yaml, note.content())
}

/// Finds the position of the closing `---` delimiter.
///
/// The closing delimiter must start a line and be followed by a newline or EOF.
fn find_closing_delimiter(content: &str) -> Result<usize, ParseError> {
    let bytes = content.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if content[pos..].starts_with("---") {
            let after = pos + 3;
            if after >= bytes.len()
                || bytes[after] == b'\n'
                || (bytes[after] == b'\r' && bytes.get(after + 1) == Some(&b'\n'))
            {
                return Ok(pos);
            }
        }

        match content[pos..].find('\n') {
            Some(offset) => pos += offset + 1,
            None => break,
        }
    }

    Err(ParseError::MissingClosingDelimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ===========================================
    // Test Helpers
    // ===========================================

    fn timestamp() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn note(title: &str, content: &str, tags: &[&str]) -> Note {
        Note::new(
            "test",
            title,
            content,
            tags.iter().map(|t| t.to_string()).collect(),
            timestamp(),
            timestamp(),
        )
    }

    // ===========================================
    // Phase 1: Parsing
    // ===========================================

    #[test]
    fn parse_full_header() {
        let content = "---\ntitle: API Design\ntags:\n- rust\n- cli\ncreated: 2024-01-15T10:30:00Z\nmodified: 2024-01-15T10:30:00Z\n---\nBody here.\n";

        let parsed = parse(content).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("API Design"));
        assert_eq!(parsed.tags, vec!["rust", "cli"]);
        assert_eq!(parsed.created, Some(timestamp()));
        assert_eq!(parsed.body, "Body here.\n");
    }

    #[test]
    fn parse_without_header_uses_whole_text() {
        let parsed = parse("# Plain markdown\n\ntext").unwrap();
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.body, "# Plain markdown\n\ntext");
    }

    #[test]
    fn parse_empty_header() {
        let parsed = parse("---\n---\nbody").unwrap();
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn parse_empty_body_at_eof() {
        let parsed = parse("---\ntitle: No Body\n---").unwrap();
        assert_eq!(parsed.title.as_deref(), Some("No Body"));
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn rejects_missing_closing_delimiter() {
        let result = parse("---\ntitle: Open\nBody without closing\n");
        assert!(matches!(result, Err(ParseError::MissingClosingDelimiter)));
    }

    #[test]
    fn rejects_invalid_yaml() {
        let result = parse("---\ntitle: Bad YAML\n  invalid indentation:\n---\n");
        assert!(matches!(result, Err(ParseError::InvalidYaml(_))));
    }

    #[test]
    fn handles_crlf_line_endings() {
        let parsed = parse("---\r\ntitle: CRLF\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(parsed.title.as_deref(), Some("CRLF"));
        assert_eq!(parsed.body, "Body\r\n");
    }

    #[test]
    fn triple_dash_in_body_not_delimiter() {
        let parsed = parse("---\ntitle: Dash\n---\nbody\n--- text after dashes\n---\n").unwrap();
        assert_eq!(parsed.body, "body\n--- text after dashes\n---\n");
    }

    // ===========================================
    // Phase 2: Round-trips
    // ===========================================

    #[test]
    fn roundtrip_preserves_fields() {
        let original = note("Title", "Line one\n\nLine [[two]]\n", &["b", "a"]);
        let parsed = parse(&serialize(&original)).unwrap();

        assert_eq!(parsed.title.as_deref(), Some("Title"));
        assert_eq!(parsed.tags, vec!["b", "a"]);
        assert_eq!(parsed.body, "Line one\n\nLine [[two]]\n");
        assert_eq!(parsed.modified, Some(timestamp()));
    }

    #[test]
    fn roundtrip_title_with_colon_and_quotes() {
        let original = note("Design: \"v2\" notes", "", &[]);
        let parsed = parse(&serialize(&original)).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Design: \"v2\" notes"));
    }

    #[test]
    fn roundtrip_numeric_looking_values() {
        let original = note("123", "yes", &["true", "42"]);
        let parsed = parse(&serialize(&original)).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("123"));
        assert_eq!(parsed.tags, vec!["true", "42"]);
        assert_eq!(parsed.body, "yes");
    }

    #[test]
    fn roundtrip_body_with_leading_delimiter() {
        let original = note("T", "---\nnot a header\n---\n", &[]);
        let parsed = parse(&serialize(&original)).unwrap();
        assert_eq!(parsed.body, "---\nnot a header\n---\n");
    }

    #[test]
    fn roundtrip_unicode() {
        let original = note("日本語タイトル", "Body with emoji: 🎉", &["café"]);
        let parsed = parse(&serialize(&original)).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("日本語タイトル"));
        assert_eq!(parsed.tags, vec!["café"]);
        assert_eq!(parsed.body, "Body with emoji: 🎉");
    }

    #[test]
    fn empty_tags_omitted_from_header() {
        let text = serialize(&note("T", "", &[]));
        assert!(!text.contains("tags"));
        assert!(text.starts_with("---\ntitle: T\n"));
    }
}
