//! Configuration file support.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Data version the current code expects on disk.
pub const REQUIRED_DATA_VERSION: u32 = 2;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "NOTEVAULT_CONFIG";

/// Errors while loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Application configuration loaded from config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding note files and their git repository
    pub notes_dir: PathBuf,

    /// Directory holding the search and backlinks databases
    pub index_dir: PathBuf,

    /// On-disk format version; files written before versioning read as 1
    #[serde(default = "legacy_data_version")]
    pub data_version: u32,

    /// Upper bound on a single git invocation, in seconds
    pub vcs_timeout_secs: u64,

    /// Author recorded on commits when none is given
    pub default_author: String,

    #[serde(skip)]
    source: Option<PathBuf>,
}

fn legacy_data_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notevault");
        Self {
            notes_dir: data_dir.join("notes"),
            index_dir: data_dir.join("index"),
            data_version: REQUIRED_DATA_VERSION,
            vcs_timeout_secs: 30,
            default_author: "notevault".to_string(),
            source: None,
        }
    }
}

impl Config {
    /// Default settings with the notes and index stored in the given
    /// directories.
    pub fn with_dirs(notes_dir: impl Into<PathBuf>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            index_dir: index_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration, with an explicit path taking precedence.
    ///
    /// Precedence order:
    /// 1. `explicit` (the CLI `--config` argument)
    /// 2. `$NOTEVAULT_CONFIG`
    /// 3. `~/.config/notevault/config.toml`
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_path(explicit, std::env::var_os(CONFIG_ENV));
        Self::load_from(&path)
    }

    /// Load configuration from a specific file.
    ///
    /// A missing file yields defaults that will be saved to `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str::<Config>(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Returns the default config file location.
    ///
    /// Default: `~/.config/notevault/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notevault")
            .join("config.toml")
    }

    /// Returns the file this config was loaded from, or will be saved to.
    pub fn path(&self) -> PathBuf {
        self.source.clone().unwrap_or_else(Self::default_path)
    }

    /// Writes the config back to its file, creating parent directories.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.path();
        let contents = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(write_err)?;
        let mut file = NamedTempFile::new_in(parent).map_err(write_err)?;
        io::Write::write_all(&mut file, contents.as_bytes()).map_err(write_err)?;
        file.persist(&path).map_err(|e| write_err(e.error))?;
        tracing::debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Creates the notes and index directories.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.notes_dir)?;
        fs::create_dir_all(&self.index_dir)
    }

    /// Returns the git timeout as a duration.
    pub fn vcs_timeout(&self) -> Duration {
        Duration::from_secs(self.vcs_timeout_secs)
    }

    /// Returns true if on-disk data predates what this build expects.
    pub fn needs_migration(&self) -> bool {
        self.data_version < REQUIRED_DATA_VERSION
    }
}

fn resolve_path(explicit: Option<&Path>, env: Option<OsString>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(Config::default_path)
}
