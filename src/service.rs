//! Note operations over storage, history and both indices.
//!
//! Every public operation holds the repository lock from its first read or
//! write until its last index update: a shared lock for queries, an
//! exclusive lock for mutations and rebuilds. Index databases are opened
//! inside the lock for each operation.

use crate::config::{Config, ConfigError, REQUIRED_DATA_VERSION};
use crate::domain::{BacklinkInfo, Note, NoteDiff, NoteUpdate, NoteVersion, WikiLink, extract_links};
use crate::index::{BACKLINKS_DB, BacklinksIndex, IndexError, SEARCH_DB, SearchIndex};
use crate::infra::frontmatter;
use crate::infra::{FileStorage, GitRepository, LockError, RepoLock, StorageError, VcsError, sanitize};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from note operations.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("invalid path '{path}': {reason}")]
    PathInvalid { path: String, reason: &'static str },

    #[error("note not found: '{path}'")]
    NotFound { path: String },

    #[error("note already exists: '{path}'")]
    AlreadyExists { path: String },

    #[error("version control error: {0}")]
    VersionControl(#[from] VcsError),

    #[error(
        "data version {current} is older than required version {required}; run `notevault migrate`"
    )]
    DataVersionBehind { current: u32, required: u32 },

    #[error("migration failed with {} error(s): {}", errors.len(), errors.join("; "))]
    MigrationPartialFailure { errors: Vec<String> },

    #[error(transparent)]
    Storage(StorageError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<StorageError> for NoteError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PathInvalid { path, reason } => NoteError::PathInvalid { path, reason },
            StorageError::NotFound { path } => NoteError::NotFound { path },
            other => NoteError::Storage(other),
        }
    }
}

/// Outcome of a full index rebuild.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RebuildResult {
    pub notes_processed: usize,
    /// `(path, message)` for each note that could not be read.
    pub errors: Vec<(String, String)>,
}

/// Orchestrates storage, git history and the indices for one repository.
#[derive(Debug, Clone)]
pub struct NoteService {
    storage: FileStorage,
    git: GitRepository,
    lock: RepoLock,
    index_dir: PathBuf,
    data_version: u32,
}

impl NoteService {
    /// Creates a service for the repository described by `config`.
    ///
    /// Nothing is created on disk until the first operation.
    pub fn new(config: &Config) -> Self {
        Self {
            storage: FileStorage::new(&config.notes_dir),
            git: GitRepository::new(&config.notes_dir, config.vcs_timeout()),
            lock: RepoLock::new(&config.notes_dir),
            index_dir: config.index_dir.clone(),
            data_version: config.data_version,
        }
    }

    /// Returns the notes directory.
    pub fn root(&self) -> &Path {
        self.storage.root()
    }

    // ===========================================
    // Mutations
    // ===========================================

    /// Creates a note and records it in history and both indices.
    pub fn create(
        &self,
        path: &str,
        title: &str,
        content: &str,
        tags: Vec<String>,
        author: &str,
    ) -> Result<Note, NoteError> {
        self.ensure_current()?;
        let path = sanitize(path)?;
        let _guard = self.lock.write()?;

        if self.storage.exists(&path) {
            return Err(NoteError::AlreadyExists { path });
        }

        let now = Utc::now();
        let note = Note::new(path.as_str(), title, content, tags, now, now);
        self.storage.write_note(&note)?;
        self.commit(author, &format!("Create note: {path}"))?;

        self.search_index()?.update_note(&note)?;
        self.backlinks_index()?
            .update_note_links(&path, &extract_links(note.content()))?;

        tracing::info!(%path, author, "created note");
        Ok(note)
    }

    /// Applies `update` to the note at `path`.
    ///
    /// A `new_path` different from `path` moves the note: the old file is
    /// removed, the new one written, and links pointing at the old path are
    /// relabeled in the backlinks index. Both sides land in one commit.
    pub fn update(&self, path: &str, update: NoteUpdate, author: &str) -> Result<Note, NoteError> {
        self.ensure_current()?;
        self.apply_update(path, update, author)
    }

    /// Deletes the note at `path`.
    ///
    /// Links from other notes to it stay in the backlinks index as broken
    /// links.
    pub fn delete(&self, path: &str, author: &str) -> Result<(), NoteError> {
        self.ensure_current()?;
        let path = sanitize(path)?;
        let _guard = self.lock.write()?;

        if !self.storage.delete(&path)? {
            return Err(NoteError::NotFound { path });
        }
        self.commit(author, &format!("Delete note: {path}"))?;

        self.search_index()?.remove_note(&path)?;
        self.backlinks_index()?.remove_note(&path)?;

        tracing::info!(%path, author, "deleted note");
        Ok(())
    }

    /// Deletes every note in a single commit and empties both indices.
    ///
    /// Returns the number of notes deleted.
    pub fn clear(&self, author: &str) -> Result<usize, NoteError> {
        self.ensure_current()?;
        let _guard = self.lock.write()?;

        let paths = self.storage.list_all()?;
        for path in &paths {
            self.storage.delete(path)?;
        }
        if !paths.is_empty() {
            self.commit(author, &format!("Clear all notes ({} deleted)", paths.len()))?;
        }

        self.search_index()?.clear()?;
        self.backlinks_index()?.clear()?;

        tracing::info!(deleted = paths.len(), author, "cleared repository");
        Ok(paths.len())
    }

    // ===========================================
    // Queries
    // ===========================================

    /// Reads the note at `path`.
    pub fn read(&self, path: &str) -> Result<Note, NoteError> {
        let path = sanitize(path)?;
        let _guard = self.lock.read()?;
        Ok(self.storage.read_note(&path)?)
    }

    /// Returns true if a note is stored at `path`.
    pub fn exists(&self, path: &str) -> Result<bool, NoteError> {
        let path = sanitize(path)?;
        let _guard = self.lock.read()?;
        Ok(self.storage.exists(&path))
    }

    /// Lists every note path, sorted.
    pub fn list_notes(&self) -> Result<Vec<String>, NoteError> {
        let _guard = self.lock.read()?;
        Ok(self.storage.list_all()?)
    }

    /// Lists notes under a folder.
    ///
    /// An empty folder lists top-level notes only; otherwise every note
    /// below `folder` is listed, at any depth.
    pub fn list_notes_in_folder(&self, folder: &str) -> Result<Vec<String>, NoteError> {
        let folder = folder.trim().trim_matches('/');
        let paths = self.list_notes()?;
        if folder.is_empty() {
            return Ok(paths.into_iter().filter(|p| !p.contains('/')).collect());
        }
        let prefix = format!("{folder}/");
        Ok(paths.into_iter().filter(|p| p.starts_with(&prefix)).collect())
    }

    /// Full-text search, best match first.
    ///
    /// Hits whose file has disappeared since indexing are skipped.
    pub fn search(&self, query: &str) -> Result<Vec<Note>, NoteError> {
        let _guard = self.lock.read()?;
        let hits = self.search_index()?.search(query)?;

        let mut notes = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.storage.read_note(&hit.path) {
                Ok(note) => notes.push(note),
                Err(StorageError::NotFound { path }) => {
                    tracing::warn!(%path, "search index references a missing note");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(notes)
    }

    /// Counts notes per tag.
    pub fn list_tags(&self) -> Result<BTreeMap<String, usize>, NoteError> {
        let _guard = self.lock.read()?;
        let mut counts = BTreeMap::new();
        for note in self.read_all()? {
            for tag in note.tags() {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    /// Returns every note carrying `tag`, sorted by path.
    pub fn find_by_tag(&self, tag: &str) -> Result<Vec<Note>, NoteError> {
        let tag = tag.trim();
        let _guard = self.lock.read()?;
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|note| note.has_tag(tag))
            .collect())
    }

    /// Returns the notes linking to `path`, sorted by source.
    pub fn backlinks(&self, path: &str) -> Result<Vec<BacklinkInfo>, NoteError> {
        let path = sanitize(path)?;
        let _guard = self.lock.read()?;
        Ok(self.backlinks_index()?.get_backlinks(&path)?)
    }

    /// Returns the targets linked from `path`, sorted.
    pub fn outgoing_links(&self, path: &str) -> Result<Vec<String>, NoteError> {
        let path = sanitize(path)?;
        let _guard = self.lock.read()?;
        Ok(self.backlinks_index()?.get_outgoing(&path)?)
    }

    /// Lists `(source, target)` links whose target does not exist.
    pub fn broken_links(&self) -> Result<Vec<(String, String)>, NoteError> {
        let _guard = self.lock.read()?;
        let existing: HashSet<String> = self.storage.list_all()?.into_iter().collect();
        Ok(self.backlinks_index()?.broken_links(&existing)?)
    }

    // ===========================================
    // History
    // ===========================================

    /// Returns the committed versions of a note, most recent first.
    pub fn history(&self, path: &str) -> Result<Vec<NoteVersion>, NoteError> {
        let path = sanitize(path)?;
        let _guard = self.lock.read()?;
        Ok(self.git.history(&path)?)
    }

    /// Reads a note as it was at `revision`.
    pub fn read_at_revision(&self, path: &str, revision: &str) -> Result<Note, NoteError> {
        let path = sanitize(path)?;
        let _guard = self.lock.read()?;
        let text = self.git.show(&path, revision)?;
        let parsed = frontmatter::parse(&text).map_err(|source| StorageError::Parse {
            path: path.clone(),
            source,
        })?;

        let fallback = self
            .git
            .history(&path)?
            .into_iter()
            .find(|v| v.revision.starts_with(revision))
            .map_or_else(Utc::now, |v| v.timestamp);
        let title = parsed
            .title
            .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(&path).to_string());
        Ok(Note::new(
            path.as_str(),
            title,
            parsed.body,
            parsed.tags,
            parsed.created.unwrap_or(fallback),
            parsed.modified.unwrap_or(fallback),
        ))
    }

    /// Line diff of a note between two revisions.
    pub fn diff(&self, path: &str, from: &str, to: &str) -> Result<NoteDiff, NoteError> {
        let path = sanitize(path)?;
        let _guard = self.lock.read()?;
        Ok(self.git.diff(&path, from, to)?)
    }

    // ===========================================
    // Maintenance
    // ===========================================

    /// Re-derives both indices from the stored notes.
    ///
    /// Notes that cannot be read are reported in the result and left out of
    /// the indices; they do not abort the rebuild.
    pub fn rebuild_indexes(&self) -> Result<RebuildResult, NoteError> {
        let _guard = self.lock.write()?;
        let mut result = RebuildResult::default();

        let mut notes = Vec::new();
        for path in self.storage.list_all()? {
            match self.storage.read_note(&path) {
                Ok(note) => notes.push(note),
                Err(e) => {
                    tracing::warn!(%path, error = %e, "skipping unreadable note");
                    result.errors.push((path, e.to_string()));
                }
            }
        }

        let links: Vec<Vec<WikiLink>> = notes.iter().map(|n| extract_links(n.content())).collect();
        self.search_index()?.rebuild(&notes)?;
        self.backlinks_index()?.rebuild(
            notes
                .iter()
                .zip(&links)
                .map(|(note, links)| (note.path(), links.as_slice())),
        )?;

        result.notes_processed = notes.len();
        tracing::info!(
            processed = result.notes_processed,
            errors = result.errors.len(),
            "rebuilt indexes"
        );
        Ok(result)
    }

    /// Notes that share a path with a folder of other notes, paired with
    /// the `<path>/index` location they would move to.
    pub fn find_overlapping_notes(&self) -> Result<Vec<(String, String)>, NoteError> {
        Ok(crate::migrate::find_overlapping_notes(&self.list_notes()?))
    }

    /// Applies an update without the data-version check.
    pub(crate) fn apply_update(
        &self,
        path: &str,
        update: NoteUpdate,
        author: &str,
    ) -> Result<Note, NoteError> {
        let path = sanitize(path)?;
        let target = update.new_path.as_deref().map(sanitize).transpose()?;
        let _guard = self.lock.write()?;

        let existing = self.storage.read_note(&path)?;
        let moved_to = target.filter(|t| *t != path);
        if let Some(target) = &moved_to
            && self.storage.exists(target)
        {
            return Err(NoteError::AlreadyExists {
                path: target.clone(),
            });
        }

        let new_path = moved_to.clone().unwrap_or_else(|| path.clone());
        let note = Note::new(
            new_path.as_str(),
            update.title.unwrap_or_else(|| existing.title().to_string()),
            update.content.unwrap_or_else(|| existing.content().to_string()),
            update.tags.unwrap_or_else(|| existing.tags().to_vec()),
            existing.created(),
            Utc::now(),
        );

        self.storage.write_note(&note)?;
        let message = match &moved_to {
            Some(to) => {
                self.storage.delete(&path)?;
                format!("Move note: {path} -> {to}")
            }
            None => format!("Update note: {path}"),
        };
        self.commit(author, &message)?;

        let mut search = self.search_index()?;
        let mut backlinks = self.backlinks_index()?;
        if let Some(to) = &moved_to {
            search.remove_note(&path)?;
            backlinks.remove_note(&path)?;
            backlinks.rename_target(&path, to)?;
        }
        search.update_note(&note)?;
        backlinks.update_note_links(&new_path, &extract_links(note.content()))?;

        tracing::info!(path = %new_path, moved = moved_to.is_some(), author, "updated note");
        Ok(note)
    }

    fn ensure_current(&self) -> Result<(), NoteError> {
        if self.data_version < REQUIRED_DATA_VERSION {
            return Err(NoteError::DataVersionBehind {
                current: self.data_version,
                required: REQUIRED_DATA_VERSION,
            });
        }
        Ok(())
    }

    fn commit(&self, author: &str, message: &str) -> Result<(), NoteError> {
        self.git.ensure_initialized()?;
        match self.git.commit(author, message) {
            Ok(_) => Ok(()),
            Err(VcsError::NothingToCommit) => {
                tracing::warn!(message, "no changes to commit");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_all(&self) -> Result<Vec<Note>, NoteError> {
        self.storage
            .list_all()?
            .iter()
            .map(|path| self.storage.read_note(path).map_err(NoteError::from))
            .collect()
    }

    fn search_index(&self) -> Result<SearchIndex, IndexError> {
        SearchIndex::open(&self.index_dir.join(SEARCH_DB))
    }

    fn backlinks_index(&self) -> Result<BacklinksIndex, IndexError> {
        BacklinksIndex::open(&self.index_dir.join(BACKLINKS_DB))
    }
}
