//! Note struct representing a stored note and the changes an update may apply.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A note as stored in the repository.
///
/// The `path` is the note's identity: a sanitized, `/`-delimited logical path
/// without extension. Title, tags and timestamps live in the file header;
/// `content` is the raw body that follows it.
///
/// # Examples
///
/// ```
/// use notevault::domain::Note;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let note = Note::new("projects/api", "API Design", "Body", vec!["design".into()], now, now);
/// assert_eq!(note.path(), "projects/api");
/// assert_eq!(note.tags(), ["design"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    path: String,
    title: String,
    content: String,
    tags: Vec<String>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl Note {
    /// Creates a new note. Tags are normalized with [`normalize_tags`].
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            content: content.into(),
            tags: normalize_tags(tags),
            created,
            modified,
        }
    }

    /// Returns the note's logical path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the note's title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the raw content body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the note's tags in display order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns true if the note carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns when the note was created.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Returns when the note was last modified.
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }
}

/// Normalizes a tag list: trims each tag, drops empty ones and removes
/// duplicates while keeping the first occurrence's position.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// A partial change to a note. Fields left as `None` keep their value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub new_path: Option<String>,
}

impl NoteUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the new content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Replaces the tag set.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Moves the note to `path`.
    pub fn move_to(mut self, path: impl Into<String>) -> Self {
        self.new_path = Some(path.into());
        self
    }

    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.new_path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn new_note_exposes_fields() {
        let note = Note::new("a/b", "Title", "Body", vec!["x".into()], now(), now());
        assert_eq!(note.path(), "a/b");
        assert_eq!(note.title(), "Title");
        assert_eq!(note.content(), "Body");
        assert!(note.has_tag("x"));
        assert!(!note.has_tag("y"));
    }

    #[test]
    fn normalize_tags_trims_and_dedupes() {
        let tags = normalize_tags(["  rust ", "cli", "", "rust", "   "]);
        assert_eq!(tags, vec!["rust".to_string(), "cli".to_string()]);
    }

    #[test]
    fn normalize_tags_keeps_case() {
        let tags = normalize_tags(["Rust", "rust"]);
        assert_eq!(tags, vec!["Rust".to_string(), "rust".to_string()]);
    }

    #[test]
    fn empty_update_is_empty() {
        assert!(NoteUpdate::new().is_empty());
        assert!(!NoteUpdate::new().title("x").is_empty());
        assert!(!NoteUpdate::new().move_to("y").is_empty());
    }
}
