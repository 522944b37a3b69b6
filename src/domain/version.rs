//! Committed versions of a note and line diffs between them.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One committed state of one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteVersion {
    pub revision: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl NoteVersion {
    /// Returns the abbreviated revision id (first 8 characters).
    pub fn short_revision(&self) -> &str {
        let end = self
            .revision
            .char_indices()
            .nth(8)
            .map_or(self.revision.len(), |(i, _)| i);
        &self.revision[..end]
    }
}

/// Line-based comparison between two revisions of a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl NoteDiff {
    /// Returns true when both revisions hold the same text.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
