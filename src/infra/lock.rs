//! Cross-process reader/writer lock over one repository.
//!
//! Built on advisory OS file locks (`flock` on Unix, `LockFileEx` on
//! Windows), so it excludes other processes as well as other handles in the
//! same process. Every acquisition opens its own file handle; the lock is
//! tied to that handle and released when the guard drops.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the lock file inside the repository root.
pub const LOCK_FILE_NAME: &str = ".notevault.lock";

/// Errors while acquiring the repository lock.
#[derive(Debug, Error)]
#[error("failed to lock {path}: {source}")]
pub struct LockError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

/// Lock mode held by a [`LockGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Hands out shared and exclusive guards for one repository.
#[derive(Debug, Clone)]
pub struct RepoLock {
    path: PathBuf,
}

impl RepoLock {
    /// Creates a lock manager for the repository at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(LOCK_FILE_NAME),
        }
    }

    /// Returns the lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until a shared lock is held.
    pub fn read(&self) -> Result<LockGuard, LockError> {
        self.acquire(LockMode::Shared)
    }

    /// Blocks until an exclusive lock is held.
    pub fn write(&self) -> Result<LockGuard, LockError> {
        self.acquire(LockMode::Exclusive)
    }

    fn acquire(&self, mode: LockMode) -> Result<LockGuard, LockError> {
        let file = self.open().map_err(|source| self.error(source))?;
        match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        }
        .map_err(|source| self.error(source))?;
        tracing::debug!(path = %self.path.display(), ?mode, "repository lock acquired");
        Ok(LockGuard { file, mode })
    }

    fn open(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
    }

    fn error(&self, source: io::Error) -> LockError {
        LockError {
            path: self.path.clone(),
            source,
        }
    }
}

/// A held repository lock; released on drop.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    mode: LockMode,
}

impl LockGuard {
    /// Returns the mode this guard holds.
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        tracing::debug!(mode = ?self.mode, "repository lock released");
    }
}
