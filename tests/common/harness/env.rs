//! Isolated test environment with its own config, notes and index dirs.

#![allow(dead_code)]

use super::{NotevaultCommand, TestNote};
use notevault::config::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated vault in a temporary directory.
///
/// Layout: `config.toml`, `notes/` and `index/` under one temp dir that is
/// removed on drop.
pub struct TestEnv {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestEnv {
    /// Creates an environment whose data is at the current version.
    pub fn new() -> Self {
        Self::with_data_version(None)
    }

    /// Creates an environment whose config records data version 1.
    pub fn legacy() -> Self {
        Self::with_data_version(Some(1))
    }

    fn with_data_version(version: Option<u32>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();

        let mut config =
            Config::load_from(&root.join("config.toml")).expect("Failed to load default config");
        config.notes_dir = root.join("notes");
        config.index_dir = root.join("index");
        config.vcs_timeout_secs = 30;
        if let Some(version) = version {
            config.data_version = version;
        }
        config.save().expect("Failed to write config");

        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the on-disk file for a note path.
    pub fn note_file(&self, path: &str) -> PathBuf {
        self.notes_dir().join(format!("{path}.md"))
    }

    /// Writes a note file directly, bypassing the CLI.
    pub fn add_note(&self, note: &TestNote) -> PathBuf {
        let file = self.note_file(note.path());
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create note directory");
        }
        std::fs::write(&file, note.to_file_contents()).expect("Failed to write test note");
        file
    }

    /// Reads the config file back.
    pub fn config(&self) -> Config {
        Config::load_from(&self.config_path()).expect("Failed to read config")
    }

    /// Creates a NotevaultCommand pointed at this environment's config.
    pub fn cmd(&self) -> NotevaultCommand {
        NotevaultCommand::new().config(&self.config_path())
    }

    /// Creates a note through the CLI and asserts success.
    pub fn create(&self, path: &str, content: &str, tags: &[&str]) {
        let mut cmd = self.cmd().new_note(path).args(["--content", content]);
        for tag in tags {
            cmd = cmd.args(["--tag", tag]);
        }
        cmd.assert().success();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // Phase 1: TestEnv Foundation
    // ===========================================

    #[test]
    fn test_env_writes_config() {
        let env = TestEnv::new();
        let config = env.config();
        assert_eq!(config.notes_dir, env.notes_dir());
        assert_eq!(config.index_dir, env.index_dir());
        assert!(!config.needs_migration());
    }

    #[test]
    fn test_legacy_env_needs_migration() {
        let env = TestEnv::legacy();
        assert_eq!(env.config().data_version, 1);
        assert!(env.config().needs_migration());
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.root().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_add_note_creates_file() {
        let env = TestEnv::new();
        let file = env.add_note(&TestNote::new("projects/alpha").tag("rust"));
        assert!(file.is_file());
        assert!(file.ends_with("notes/projects/alpha.md"));
        let text = std::fs::read_to_string(file).unwrap();
        assert!(text.starts_with("---\n"));
        assert!(text.contains("title: alpha"));
    }
}
