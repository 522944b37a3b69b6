//! File storage backend: path sanitizing, atomic writes and note enumeration.

use crate::domain::Note;
use crate::infra::frontmatter::{ParseError, parse, serialize};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Extension appended to every note file.
pub const NOTE_EXTENSION: &str = "md";

/// Errors during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid path '{path}': {reason}")]
    PathInvalid { path: String, reason: &'static str },

    #[error("note not found: {path}")]
    NotFound { path: String },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse note at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn invalid(path: &str, reason: &'static str) -> Self {
        StorageError::PathInvalid {
            path: path.to_string(),
            reason,
        }
    }
}

/// Canonicalizes a logical note path.
///
/// Surrounding whitespace is trimmed and a single leading `/` is dropped, so
/// an absolute path is read as relative to the repository root. `.` segments
/// and empty segments collapse; `..` pops the previous segment and may not
/// climb above the root. Segments starting with `.` are reserved for
/// repository metadata (`.git`, the lock file) and are rejected.
///
/// # Errors
///
/// Returns `StorageError::PathInvalid` for empty input, traversal outside
/// the root, hidden segments, or backslash/NUL characters.
///
/// ```
/// use notevault::infra::sanitize;
///
/// assert_eq!(sanitize("  /etc/passwd ").unwrap(), "etc/passwd");
/// assert_eq!(sanitize("a/./b//c").unwrap(), "a/b/c");
/// assert!(sanitize("foo/../../outside").is_err());
/// ```
pub fn sanitize(path: &str) -> Result<String, StorageError> {
    let trimmed = path.trim();
    if trimmed.trim_matches('/').is_empty() {
        return Err(StorageError::invalid(path, "path cannot be empty"));
    }
    if trimmed.contains(['\\', '\0']) {
        return Err(StorageError::invalid(path, "path contains invalid characters"));
    }

    let relative = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let mut segments: Vec<&str> = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(StorageError::invalid(path, "path escapes the repository"));
                }
            }
            s if s.starts_with('.') => {
                return Err(StorageError::invalid(path, "hidden path segments are reserved"));
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(StorageError::invalid(path, "path cannot be empty"));
    }

    Ok(segments.join("/"))
}

/// Filesystem-backed note storage rooted at one repository directory.
///
/// Every method takes an already-sanitized path; the note service
/// sanitizes once at its boundary.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates a storage backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a canonical note path to its file.
    pub fn file_path(&self, path: &str) -> PathBuf {
        let mut file = self.root.clone();
        for segment in path.split('/') {
            file.push(segment);
        }
        let mut name = file.into_os_string();
        name.push(".");
        name.push(NOTE_EXTENSION);
        PathBuf::from(name)
    }

    /// Returns true if a note file exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.file_path(path).is_file()
    }

    /// Reads the raw text of a note file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no file exists at `path`.
    pub fn read(&self, path: &str) -> Result<String, StorageError> {
        let file = self.file_path(path);
        fs::read_to_string(&file).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound {
                path: path.to_string(),
            },
            _ => StorageError::io(&file, e),
        })
    }

    /// Writes raw text to a note file atomically.
    ///
    /// Parent directories are created as needed. The text goes to a
    /// temporary file in the target directory which is then renamed over
    /// the destination, so readers never see a partial file.
    pub fn write(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let file = self.file_path(path);
        let parent = file.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| StorageError::io(&file, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| StorageError::io(&file, e))?;
        temp.persist(&file)
            .map_err(|e| StorageError::io(&file, e.error))?;
        Ok(())
    }

    /// Deletes a note file, pruning directories left empty.
    ///
    /// Returns whether a file existed.
    pub fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let file = self.file_path(path);
        match fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StorageError::io(&file, e)),
        }

        let mut dir = file.parent();
        while let Some(d) = dir {
            if d == self.root || !d.starts_with(&self.root) || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
        Ok(true)
    }

    /// Lists every stored note path, sorted.
    ///
    /// Hidden files and directories are skipped. A missing root is an empty
    /// repository.
    pub fn list_all(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        if !self.root.is_dir() {
            return Err(StorageError::io(
                &self.root,
                io::Error::other("repository root is not a directory"),
            ));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                StorageError::io(&path, io::Error::other(e.to_string()))
            })?;
            if !entry.file_type().is_file() || !has_note_extension(&entry) {
                continue;
            }
            if let Some(path) = self.logical_path(entry.path()) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Reads and parses the note stored at `path`.
    ///
    /// Header fields absent from the file fall back to the last path segment
    /// (title) and the file's modification time (timestamps).
    pub fn read_note(&self, path: &str) -> Result<Note, StorageError> {
        let text = self.read(path)?;
        let parsed = parse(&text).map_err(|source| StorageError::Parse {
            path: path.to_string(),
            source,
        })?;

        let (created, modified) = match (parsed.created, parsed.modified) {
            (Some(c), Some(m)) => (c, m),
            (c, m) => {
                let mtime = self.file_mtime(path)?;
                (c.unwrap_or(mtime), m.unwrap_or(mtime))
            }
        };
        let title = parsed
            .title
            .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path).to_string());

        Ok(Note::new(path, title, parsed.body, parsed.tags, created, modified))
    }

    /// Serializes and writes a note to its path.
    pub fn write_note(&self, note: &Note) -> Result<(), StorageError> {
        self.write(note.path(), &serialize(note))
    }

    fn file_mtime(&self, path: &str) -> Result<DateTime<Utc>, StorageError> {
        let file = self.file_path(path);
        let modified = fs::metadata(&file)
            .and_then(|m| m.modified())
            .map_err(|e| StorageError::io(&file, e))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn logical_path(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.root).ok()?.with_extension("");
        let segments: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(segments.join("/"))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn has_note_extension(entry: &DirEntry) -> bool {
    entry.path().extension().is_some_and(|e| e == NOTE_EXTENSION)
}
