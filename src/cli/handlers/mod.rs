//! Command handlers for the CLI.

mod history;
mod links;
mod list;
mod maintenance;
mod notes;
mod tool;

use anyhow::{Context, Result};
use std::io::{self, IsTerminal, Read};

pub use history::{handle_diff, handle_history};
pub use links::{handle_backlinks, handle_check};
pub use list::{handle_list, handle_search, handle_tagged, handle_tags};
pub use maintenance::{handle_clear, handle_init, handle_migrate, handle_rebuild};
pub use notes::{handle_edit, handle_new, handle_rm, handle_show};
pub use tool::handle_tool;

// ===========================================
// Shared Utilities
// ===========================================

/// Reads all of stdin, or returns `None` when stdin is a terminal.
pub(crate) fn read_piped_stdin() -> Result<Option<String>> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(Some(buf))
}

/// Truncates a string to a maximum display width, adding ellipsis if needed.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// Formats a list of line numbers as `line 3` or `lines 1, 4`.
pub(crate) fn format_lines(lines: &[usize]) -> String {
    let numbers: Vec<String> = lines.iter().map(ToString::to_string).collect();
    let label = if lines.len() == 1 { "line" } else { "lines" };
    format!("{} {}", label, numbers.join(", "))
}
