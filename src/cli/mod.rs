//! CLI command definitions and handlers

pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::OutputFormat;

/// notevault - versioned markdown notes with search and backlinks
#[derive(Parser, Debug)]
#[command(name = "notevault", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: $NOTEVAULT_CONFIG or ~/.config/notevault/config.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Notes directory (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Author recorded on commits (overrides config file)
    #[arg(long, global = true)]
    pub author: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create data directories and the git repository
    Init,

    /// Create a new note
    New(NewArgs),

    /// Show a note's contents
    Show(ShowArgs),

    /// Change a note's title, content or tags, or move it
    Edit(EditArgs),

    /// Delete a note
    Rm(RmArgs),

    /// List notes, optionally within a folder
    Ls(ListArgs),

    /// Full-text search across notes
    Search(SearchArgs),

    /// List all tags with note counts
    Tags(TagsArgs),

    /// List notes carrying a tag
    Tagged(TaggedArgs),

    /// Show notes that link to a given note
    Backlinks(BacklinksArgs),

    /// Show the committed versions of a note
    History(HistoryArgs),

    /// Show line changes to a note between two revisions
    Diff(DiffArgs),

    /// Rebuild the search and backlinks indices from note files
    Rebuild,

    /// Upgrade on-disk data to the current version
    Migrate(MigrateArgs),

    /// Check for broken links
    Check,

    /// Delete every note
    Clear(ClearArgs),

    /// Call a tool by name with JSON arguments
    Tool(ToolArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `new` command
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Note path, e.g. projects/api-design
    pub path: String,

    /// Note title (defaults to the last path segment)
    #[arg(short = 'T', long)]
    pub title: Option<String>,

    /// Tag for the note (can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Note content (read from stdin when omitted and stdin is not a terminal)
    #[arg(short = 'C', long)]
    pub content: Option<String>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Note path
    pub path: String,

    /// Show the note as of this revision
    #[arg(short, long)]
    pub revision: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `edit` command
#[derive(Parser, Debug)]
pub struct EditArgs {
    /// Note path
    pub path: String,

    /// New title
    #[arg(short = 'T', long)]
    pub title: Option<String>,

    /// New content ("-" reads stdin)
    #[arg(short = 'C', long)]
    pub content: Option<String>,

    /// Tag for the note (replaces all tags, can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Remove all tags from the note
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,

    /// Move the note to a new path
    #[arg(short, long)]
    pub move_to: Option<String>,
}

/// Arguments for the `rm` command
#[derive(Parser, Debug)]
pub struct RmArgs {
    /// Note path
    pub path: String,
}

/// Arguments for the `ls` (list) command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Folder to list ("" or "/" lists top-level notes only)
    pub folder: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `tags` command
#[derive(Parser, Debug)]
pub struct TagsArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `tagged` command
#[derive(Parser, Debug)]
pub struct TaggedArgs {
    /// Tag to look for
    pub tag: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `backlinks` command
#[derive(Parser, Debug)]
pub struct BacklinksArgs {
    /// Note path
    pub path: String,

    /// Show links going out of the note instead
    #[arg(long)]
    pub outgoing: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `history` command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Note path
    pub path: String,

    /// Maximum number of versions
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `diff` command
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Note path
    pub path: String,

    /// Older revision
    pub from: String,

    /// Newer revision
    pub to: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `migrate` command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Only report what would change
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `clear` command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Required to actually delete notes
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `tool` command
#[derive(Parser, Debug)]
pub struct ToolArgs {
    /// Tool name (omit to list tools)
    pub name: Option<String>,

    /// Arguments as a JSON object
    pub args: Option<String>,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
