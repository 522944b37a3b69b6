//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::Note;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
    /// Plain note paths, one per line
    Paths,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Prints the wrapped value as pretty JSON on stdout.
    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// A single note in listing output.
#[derive(Debug, Serialize)]
pub struct NoteListing {
    pub path: String,
    pub title: String,
    pub tags: Vec<String>,
    pub modified: String,
}

impl From<&Note> for NoteListing {
    fn from(note: &Note) -> Self {
        Self {
            path: note.path().to_string(),
            title: note.title().to_string(),
            tags: note.tags().to_vec(),
            modified: note.modified().to_rfc3339(),
        }
    }
}

/// A tag with its note count.
#[derive(Debug, Serialize)]
pub struct TagListing {
    pub name: String,
    pub count: usize,
}
