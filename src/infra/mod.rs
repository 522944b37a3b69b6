//! File storage, note file codec, repository lock and git history

pub mod frontmatter;
pub mod git;
pub mod lock;
pub mod storage;

pub use frontmatter::{ParseError, ParsedNote};
pub use git::{GitRepository, VcsError};
pub use lock::{LockError, LockGuard, LockMode, RepoLock};
pub use storage::{FileStorage, NOTE_EXTENSION, StorageError, sanitize};
