//! History and diff command handlers.

use anyhow::{Context, Result};

use crate::cli::output::{Output, OutputFormat};
use crate::cli::{DiffArgs, HistoryArgs};
use crate::service::NoteService;

pub fn handle_history(args: &HistoryArgs, service: &NoteService) -> Result<()> {
    let mut versions = service
        .history(&args.path)
        .with_context(|| format!("failed to read history of '{}'", args.path))?;
    if let Some(limit) = args.limit {
        versions.truncate(limit);
    }

    match args.format {
        OutputFormat::Human => {
            if versions.is_empty() {
                println!("No history for '{}'.", args.path);
            }
            for version in &versions {
                println!(
                    "{}  {}  {:<16}  {}",
                    version.short_revision(),
                    version.timestamp.format("%Y-%m-%d %H:%M"),
                    version.author,
                    version.message
                );
            }
        }
        OutputFormat::Json => Output::new(&versions).print()?,
        OutputFormat::Paths => {
            for version in &versions {
                println!("{}", version.revision);
            }
        }
    }
    Ok(())
}

pub fn handle_diff(args: &DiffArgs, service: &NoteService) -> Result<()> {
    let diff = service
        .diff(&args.path, &args.from, &args.to)
        .with_context(|| {
            format!(
                "failed to diff '{}' between {} and {}",
                args.path, args.from, args.to
            )
        })?;

    match args.format {
        OutputFormat::Json => Output::new(&diff).print()?,
        _ if diff.is_empty() => println!("No changes."),
        _ => {
            for line in &diff.removed {
                println!("- {}", line);
            }
            for line in &diff.added {
                println!("+ {}", line);
            }
        }
    }
    Ok(())
}
