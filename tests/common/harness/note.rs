//! Builder for note files placed on disk before the CLI runs.

#![allow(dead_code)]

use chrono::Utc;
use notevault::domain::Note;
use notevault::infra::frontmatter::serialize;

/// Builder for a note file with a YAML header.
#[derive(Debug)]
pub struct TestNote {
    path: String,
    title: String,
    tags: Vec<String>,
    body: String,
}

impl TestNote {
    /// Creates a note at `path`, titled after its last segment.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let title = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            title,
            tags: Vec::new(),
            body: String::new(),
        }
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the body content.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the logical note path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Renders the file text.
    pub fn to_file_contents(&self) -> String {
        let now = Utc::now();
        let note = Note::new(
            self.path.as_str(),
            self.title.as_str(),
            self.body.as_str(),
            self.tags.clone(),
            now,
            now,
        );
        serialize(&note)
    }
}
