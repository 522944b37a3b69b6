//! Fluent wrapper around assert_cmd::Command.

#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Fluent wrapper around `assert_cmd::Command` for the `notevault` binary.
pub struct NotevaultCommand {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
}

impl NotevaultCommand {
    /// Creates a new command for the `notevault` binary.
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: Vec::new(),
            stdin: None,
        }
    }

    /// Sets the `--config` option.
    pub fn config(mut self, path: &Path) -> Self {
        self.args.push("--config".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Sets an environment variable for the child process.
    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Feeds `input` to the command's stdin.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Returns the current arguments (for testing).
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("notevault").expect("Failed to find notevault binary");
        cmd.args(&self.args)
            .env_remove("RUST_LOG")
            .env_remove("NOTEVAULT_CONFIG")
            .envs(self.envs);
        if let Some(input) = self.stdin {
            cmd.write_stdin(input);
        }
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for the `init` command.
    pub fn init(self) -> Self {
        self.args(["init"])
    }

    /// Configures for the `new` command with a path.
    pub fn new_note(self, path: &str) -> Self {
        self.args(["new", path])
    }

    /// Configures for the `show` command with a path.
    pub fn show(self, path: &str) -> Self {
        self.args(["show", path])
    }

    /// Configures for the `edit` command with a path.
    pub fn edit(self, path: &str) -> Self {
        self.args(["edit", path])
    }

    /// Configures for the `ls` command.
    pub fn ls(self) -> Self {
        self.args(["ls"])
    }

    /// Configures for the `search` command with a query.
    pub fn search(self, query: &str) -> Self {
        self.args(["search", query])
    }

    /// Configures for the `history` command with a path.
    pub fn history(self, path: &str) -> Self {
        self.args(["history", path])
    }

    // ===========================================
    // Format Options
    // ===========================================

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }

    /// Adds `--format paths` to the command.
    pub fn format_paths(self) -> Self {
        self.args(["--format", "paths"])
    }
}

impl Default for NotevaultCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ===========================================
    // Phase 1: NotevaultCommand Basics
    // ===========================================

    #[test]
    fn test_command_runs_binary() {
        NotevaultCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_with_config() {
        let temp = TempDir::new().unwrap();
        let cmd = NotevaultCommand::new().config(temp.path());
        let args = cmd.get_args();
        assert_eq!(args[0], "--config");
        assert_eq!(args[1], temp.path().to_string_lossy());
    }

    #[test]
    fn test_command_shortcuts() {
        let cmd = NotevaultCommand::new().ls().format_json();
        let args = cmd.get_args();
        assert!(args.contains(&"ls".to_string()));
        assert!(args.contains(&"--format".to_string()));
        assert!(args.contains(&"json".to_string()));
    }
}
