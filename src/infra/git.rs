//! Version history through the external `git` tool.
//!
//! Every invocation is a blocking subprocess call bounded by a timeout; on
//! expiry the child is killed and the call fails with [`VcsError::Timeout`].

use crate::domain::{NoteDiff, NoteVersion};
use crate::infra::storage::NOTE_EXTENSION;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default bound on a single git invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Committer identity and settings applied to every invocation, so commits
/// work without any user-level git configuration.
const CONFIG_ARGS: &[&str] = &[
    "-c",
    "user.name=notevault",
    "-c",
    "user.email=notevault@localhost",
    "-c",
    "commit.gpgsign=false",
    "-c",
    "core.quotepath=false",
];

const FIELD_SEP: char = '\x1f';

/// Errors from the version-control backend.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The working tree has no staged changes.
    #[error("nothing to commit")]
    NothingToCommit,

    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed to run git: {0}")]
    Spawn(#[source] io::Error),

    #[error("unexpected git output: {0}")]
    InvalidOutput(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

struct GitOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

/// A git repository whose working tree is the notes directory.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
    timeout: Duration,
}

impl GitRepository {
    /// Wraps the repository at `root`. Nothing is touched until a method runs.
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    /// Returns the working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true if the repository already exists.
    pub fn is_initialized(&self) -> bool {
        self.root.join(".git").exists()
    }

    /// Creates the repository if absent.
    ///
    /// Returns `true` if a repository was created, `false` if one existed.
    pub fn ensure_initialized(&self) -> Result<bool, VcsError> {
        if self.is_initialized() {
            return Ok(false);
        }
        fs::create_dir_all(&self.root).map_err(|source| VcsError::Io {
            path: self.root.clone(),
            source,
        })?;
        self.run_checked(&["init", "--quiet"])?;
        tracing::info!(root = %self.root.display(), "initialized git repository");
        Ok(true)
    }

    /// Stages every note file (additions, edits and deletions) and commits.
    ///
    /// Returns the new revision id.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::NothingToCommit` when no note file changed.
    pub fn commit(&self, author: &str, message: &str) -> Result<String, VcsError> {
        let pattern = format!("*.{NOTE_EXTENSION}");
        let add = self.run(&["add", "-A", "--", &pattern])?;
        if !add.status.success() {
            // A pathspec that matches nothing means no note was ever stored.
            if add.stderr.contains("did not match any files") {
                return Err(VcsError::NothingToCommit);
            }
            return Err(failure("git add", &add));
        }

        let staged = self.run(&["diff", "--cached", "--quiet"])?;
        if staged.status.success() {
            return Err(VcsError::NothingToCommit);
        }

        let author = format_author(author);
        self.run_checked(&["commit", "--quiet", "--no-verify", "--author", &author, "-m", message])?;
        let revision = self.run_checked(&["rev-parse", "HEAD"])?.trim().to_string();
        tracing::debug!(%revision, %author, message, "committed");
        Ok(revision)
    }

    /// Returns true once at least one commit exists.
    pub fn has_commits(&self) -> Result<bool, VcsError> {
        if !self.is_initialized() {
            return Ok(false);
        }
        Ok(self
            .run(&["rev-parse", "--verify", "--quiet", "HEAD"])?
            .status
            .success())
    }

    /// Returns the commits touching a note, most recent first.
    ///
    /// History follows the note across moves. A note that was never
    /// committed has an empty history.
    pub fn history(&self, path: &str) -> Result<Vec<NoteVersion>, VcsError> {
        if !self.has_commits()? {
            return Ok(Vec::new());
        }
        let file = note_file(path);
        let format = "--format=%H%x1f%an%x1f%aI%x1f%s";
        let stdout = self.run_checked(&["log", "--follow", format, "--", &file])?;
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_log_line)
            .collect()
    }

    /// Returns a note's file text as of `revision`.
    pub fn show(&self, path: &str, revision: &str) -> Result<String, VcsError> {
        let spec = format!("{}:{}", revision, note_file(path));
        self.run_checked(&["show", &spec])
    }

    /// Compares a note's file between two revisions, line by line.
    pub fn diff(&self, path: &str, from: &str, to: &str) -> Result<NoteDiff, VcsError> {
        let file = note_file(path);
        let stdout = self.run_checked(&["diff", "--no-color", "--unified=0", from, to, "--", &file])?;
        Ok(parse_diff(&stdout))
    }

    fn run_checked(&self, args: &[&str]) -> Result<String, VcsError> {
        let output = self.run(args)?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(failure(&format!("git {}", args.first().unwrap_or(&"")), &output))
        }
    }

    fn run(&self, args: &[&str]) -> Result<GitOutput, VcsError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(%command, root = %self.root.display(), "running git");

        let mut git = Command::new("git");
        git.args(CONFIG_ARGS)
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0");
        run_bounded(git, command, self.timeout)
    }
}

/// Runs `cmd` to completion, killing it once `timeout` has elapsed.
fn run_bounded(mut cmd: Command, label: String, timeout: Duration) -> Result<GitOutput, VcsError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(VcsError::Spawn)?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let mut pause = Duration::from_millis(1);
    let status = loop {
        if let Some(status) = child.try_wait().map_err(VcsError::Spawn)? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(command = %label, ?timeout, "git timed out");
            return Err(VcsError::Timeout {
                command: label,
                timeout,
            });
        }
        thread::sleep(pause);
        pause = (pause * 2).min(Duration::from_millis(25));
    };

    Ok(GitOutput {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

/// Formats an author for `git commit --author`, which needs `Name <email>`.
fn format_author(author: &str) -> String {
    let author = author.trim();
    if author.contains('<') && author.ends_with('>') {
        return author.to_string();
    }
    let name = if author.is_empty() { "unknown" } else { author };
    let handle: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{name} <{handle}@notevault.local>")
}

fn note_file(path: &str) -> String {
    format!("{path}.{NOTE_EXTENSION}")
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn failure(command: &str, output: &GitOutput) -> VcsError {
    VcsError::CommandFailed {
        command: command.to_string(),
        status: output.status.to_string(),
        stderr: output.stderr.trim().to_string(),
    }
}

fn parse_log_line(line: &str) -> Result<NoteVersion, VcsError> {
    let fields: Vec<&str> = line.splitn(4, FIELD_SEP).collect();
    let [revision, author, date, message] = fields[..] else {
        return Err(VcsError::InvalidOutput(line.to_string()));
    };
    let timestamp = DateTime::parse_from_rfc3339(date)
        .map_err(|_| VcsError::InvalidOutput(line.to_string()))?
        .with_timezone(&Utc);
    Ok(NoteVersion {
        revision: revision.to_string(),
        author: author.to_string(),
        timestamp,
        message: message.to_string(),
    })
}

/// Collects added and removed lines from unified diff output.
///
/// File headers (`---`/`+++`) only appear before the first hunk, so lines
/// are classified only inside hunks.
fn parse_diff(output: &str) -> NoteDiff {
    let mut diff = NoteDiff::default();
    let mut in_hunk = false;
    for line in output.lines() {
        if line.starts_with("diff --git") {
            in_hunk = false;
        } else if line.starts_with("@@") {
            in_hunk = true;
        } else if in_hunk {
            if let Some(added) = line.strip_prefix('+') {
                diff.added.push(added.to_string());
            } else if let Some(removed) = line.strip_prefix('-') {
                diff.removed.push(removed.to_string());
            }
        }
    }
    diff
}
