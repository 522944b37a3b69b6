//! Wiki-style links between notes and the backlink records derived from them.

use serde::Serialize;
use std::sync::LazyLock;

use regex::Regex;

use crate::infra::sanitize;

/// Matches `[[target]]` and `[[target|display text]]`.
static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|\n]+)(?:\|([^\[\]\n]*))?\]\]").expect("wiki link pattern is valid")
});

/// An outbound reference from a note's content to another note.
///
/// Links are recomputed from content on every write and never stored on
/// their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    pub target_path: String,
    pub display_text: Option<String>,
    /// 1-based line within the content.
    pub line_number: usize,
}

impl WikiLink {
    /// Creates a link without display text.
    pub fn new(target_path: impl Into<String>, line_number: usize) -> Self {
        Self {
            target_path: target_path.into(),
            display_text: None,
            line_number,
        }
    }

    /// Sets the display text.
    pub fn with_display(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }
}

/// Extracts every wiki link from `content`, in reading order.
///
/// Targets are canonicalized the same way note paths are, so `[[/a/b]]`,
/// `[[a//b]]` and `[[a/./b]]` all refer to note `a/b`. Links whose target
/// is empty or could never name a note (escaping the root, hidden segments)
/// are skipped.
///
/// ```
/// use notevault::domain::extract_links;
///
/// let links = extract_links("See [[projects/api|the API]].\n\n[[todo]]");
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].target_path, "projects/api");
/// assert_eq!(links[0].display_text.as_deref(), Some("the API"));
/// assert_eq!(links[1].line_number, 3);
/// ```
pub fn extract_links(content: &str) -> Vec<WikiLink> {
    let mut links = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for caps in WIKI_LINK.captures_iter(line) {
            let Ok(target) = sanitize(&caps[1]) else {
                continue;
            };
            let display_text = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());
            links.push(WikiLink {
                target_path: target,
                display_text,
                line_number: idx + 1,
            });
        }
    }
    links
}

/// All links from one source note to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklinkInfo {
    pub source_path: String,
    /// Deduplicated, ascending.
    pub line_numbers: Vec<usize>,
}

impl BacklinkInfo {
    /// Creates a backlink record, sorting and deduplicating `line_numbers`.
    pub fn new(source_path: impl Into<String>, mut line_numbers: Vec<usize>) -> Self {
        line_numbers.sort_unstable();
        line_numbers.dedup();
        Self {
            source_path: source_path.into(),
            line_numbers,
        }
    }

    /// Number of distinct lines on which the source links to the target.
    pub fn link_count(&self) -> usize {
        self.line_numbers.len()
    }
}
