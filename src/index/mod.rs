//! SQLite-backed search and backlink indices.
//!
//! Both indices are caches over the stored notes and can be rebuilt from
//! them at any time. Each lives in its own database file under the index
//! directory and is opened per operation.

mod backlinks;
mod search;

pub use backlinks::BacklinksIndex;
pub use search::{SearchHit, SearchIndex, tokenize};

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name of the search index inside the index directory.
pub const SEARCH_DB: &str = "search.db";

/// File name of the backlinks index inside the index directory.
pub const BACKLINKS_DB: &str = "backlinks.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O error occurred while preparing the index location.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Opens or creates a database file and applies `schema`.
///
/// Creates parent directories if they don't exist.
fn open_database(path: &Path, schema: &str) -> IndexResult<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|source| IndexError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(schema)?;
    Ok(conn)
}
