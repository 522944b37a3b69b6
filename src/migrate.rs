//! Forward-only migrations of on-disk note conventions, and repository setup.
//!
//! The persisted data version lives in the config file. Migrations run in
//! order from that version up to [`REQUIRED_DATA_VERSION`]; the version is
//! advanced and saved only when every step finished without errors.

use crate::config::{Config, REQUIRED_DATA_VERSION};
use crate::domain::NoteUpdate;
use crate::infra::{FileStorage, GitRepository, RepoLock, StorageError, VcsError};
use crate::service::{NoteError, NoteService};
use serde::Serialize;
use std::collections::BTreeSet;

/// Author recorded on commits made by migrations.
pub const MIGRATION_AUTHOR: &str = "migration";

const IMPORT_AUTHOR: &str = "notevault <notevault@local>";
const IMPORT_MESSAGE: &str = "Initial import of existing notes";

/// The data a migration reads and rewrites.
///
/// Implementations must not apply the data-version check: migrations run
/// precisely while the data is behind.
pub trait MigrationTarget {
    /// Lists every stored note path.
    fn list_paths(&self) -> Result<Vec<String>, NoteError>;

    /// Moves a note, keeping its content and history.
    fn move_note(&self, from: &str, to: &str, author: &str) -> Result<(), NoteError>;
}

impl MigrationTarget for NoteService {
    fn list_paths(&self) -> Result<Vec<String>, NoteError> {
        self.list_notes()
    }

    fn move_note(&self, from: &str, to: &str, author: &str) -> Result<(), NoteError> {
        self.apply_update(from, NoteUpdate::new().move_to(to), author)
            .map(|_| ())
    }
}

/// What a migration run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub from_version: u32,
    pub to_version: u32,
    pub notes_moved: Vec<(String, String)>,
    pub errors: Vec<String>,
}

impl MigrationResult {
    fn new(from_version: u32, to_version: u32) -> Self {
        Self {
            from_version,
            to_version,
            notes_moved: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// True if every step completed without errors.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turns a failed run into `NoteError::MigrationPartialFailure`.
    pub fn into_outcome(self) -> Result<Self, NoteError> {
        if self.success() {
            Ok(self)
        } else {
            Err(NoteError::MigrationPartialFailure {
                errors: self.errors,
            })
        }
    }
}

struct Migration {
    /// Version this step upgrades from; it produces `from + 1`.
    from: u32,
    description: &'static str,
    run: fn(&dyn MigrationTarget, &mut MigrationResult) -> Result<(), NoteError>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    from: 1,
    description: "move notes that shadow a folder to <folder>/index",
    run: move_overlapping_notes,
}];

/// Finds notes whose path is also a folder holding other notes.
///
/// Each is paired with `<path>/index`, skipped when that path is taken.
/// Sorted by the old path.
pub fn find_overlapping_notes(paths: &[String]) -> Vec<(String, String)> {
    let all: BTreeSet<&str> = paths.iter().map(String::as_str).collect();
    all.iter()
        .filter(|path| {
            let prefix = format!("{path}/");
            all.range(prefix.as_str()..)
                .next()
                .is_some_and(|next| next.starts_with(&prefix))
        })
        .map(|path| (path.to_string(), format!("{path}/index")))
        .filter(|(_, proposed)| !all.contains(proposed.as_str()))
        .collect()
}

fn move_overlapping_notes(
    target: &dyn MigrationTarget,
    result: &mut MigrationResult,
) -> Result<(), NoteError> {
    let overlaps = find_overlapping_notes(&target.list_paths()?);
    for (old, new) in overlaps {
        match target.move_note(&old, &new, MIGRATION_AUTHOR) {
            Ok(()) => {
                tracing::info!(from = %old, to = %new, "moved overlapping note");
                result.notes_moved.push((old, new));
            }
            Err(e) => {
                tracing::warn!(path = %old, error = %e, "failed to move overlapping note");
                result.errors.push(format!("Error moving {old}: {e}"));
            }
        }
    }
    Ok(())
}

/// Runs every pending migration against `target`.
///
/// On success `config.data_version` is advanced and the config saved. When
/// a step reports errors the run stops there and the version is left
/// untouched; the errors are in the returned result.
pub fn run_migrations(
    config: &mut Config,
    target: &dyn MigrationTarget,
) -> Result<MigrationResult, NoteError> {
    let from_version = config.data_version;
    if from_version >= REQUIRED_DATA_VERSION {
        return Ok(MigrationResult::new(from_version, from_version));
    }

    let mut result = MigrationResult::new(from_version, REQUIRED_DATA_VERSION);
    for step in MIGRATIONS
        .iter()
        .filter(|m| m.from >= from_version && m.from < REQUIRED_DATA_VERSION)
    {
        tracing::info!(from = step.from, to = step.from + 1, step = step.description, "running migration");
        (step.run)(target, &mut result)?;
        if !result.success() {
            tracing::warn!(errors = result.errors.len(), "migration stopped on errors");
            return Ok(result);
        }
    }

    config.data_version = REQUIRED_DATA_VERSION;
    config.save()?;
    tracing::info!(version = REQUIRED_DATA_VERSION, "data version advanced");
    Ok(result)
}

/// Prepares the data directories and git repository.
///
/// Returns `true` if a repository was created. Notes already present in a
/// new repository are recorded in one import commit.
pub fn ensure_repository(config: &Config) -> Result<bool, NoteError> {
    config.ensure_dirs().map_err(|source| {
        NoteError::Storage(StorageError::Io {
            path: config.notes_dir.clone(),
            source,
        })
    })?;

    let git = GitRepository::new(&config.notes_dir, config.vcs_timeout());
    if git.is_initialized() {
        return Ok(false);
    }

    let _guard = RepoLock::new(&config.notes_dir).write()?;
    if !git.ensure_initialized()? {
        return Ok(false);
    }

    let existing = FileStorage::new(&config.notes_dir).list_all()?;
    if !existing.is_empty() {
        match git.commit(IMPORT_AUTHOR, IMPORT_MESSAGE) {
            Ok(_) | Err(VcsError::NothingToCommit) => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(notes = existing.len(), "imported existing notes into history");
    }
    Ok(true)
}
