//! New, show, edit and rm command handlers.

use anyhow::{Context, Result, bail};

use super::read_piped_stdin;
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{EditArgs, NewArgs, RmArgs, ShowArgs};
use crate::domain::{Note, NoteUpdate};
use crate::service::NoteService;

pub fn handle_new(args: &NewArgs, service: &NoteService, author: &str) -> Result<()> {
    let content = match &args.content {
        Some(content) => content.clone(),
        None => read_piped_stdin()?.unwrap_or_default(),
    };
    let title = args.title.clone().unwrap_or_else(|| default_title(&args.path));

    let note = service
        .create(&args.path, &title, &content, args.tags.clone(), author)
        .with_context(|| format!("failed to create note '{}'", args.path))?;

    println!("Created note: {}", note.path());
    Ok(())
}

pub fn handle_show(args: &ShowArgs, service: &NoteService) -> Result<()> {
    let note = match &args.revision {
        Some(revision) => service
            .read_at_revision(&args.path, revision)
            .with_context(|| format!("failed to read '{}' at {}", args.path, revision))?,
        None => service
            .read(&args.path)
            .with_context(|| format!("failed to read note '{}'", args.path))?,
    };

    match args.format {
        OutputFormat::Human => print_note(&note),
        OutputFormat::Json => Output::new(&note).print()?,
        OutputFormat::Paths => println!("{}", note.path()),
    }
    Ok(())
}

pub fn handle_edit(args: &EditArgs, service: &NoteService, author: &str) -> Result<()> {
    let content = match args.content.as_deref() {
        Some("-") => Some(read_piped_stdin()?.unwrap_or_default()),
        other => other.map(str::to_string),
    };
    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tags.is_empty() {
        None
    } else {
        Some(args.tags.clone())
    };

    let update = NoteUpdate {
        title: args.title.clone(),
        content,
        tags,
        new_path: args.move_to.clone(),
    };
    if update.is_empty() {
        bail!("nothing to change: pass --title, --content, --tag, --clear-tags or --move-to");
    }

    let note = service
        .update(&args.path, update, author)
        .with_context(|| format!("failed to update note '{}'", args.path))?;

    if args.move_to.is_some() && note.path() != args.path.trim().trim_start_matches('/') {
        println!("Moved note: {} -> {}", args.path.trim(), note.path());
    } else {
        println!("Updated note: {}", note.path());
    }
    Ok(())
}

pub fn handle_rm(args: &RmArgs, service: &NoteService, author: &str) -> Result<()> {
    service
        .delete(&args.path, author)
        .with_context(|| format!("failed to delete note '{}'", args.path))?;
    println!("Deleted note: {}", args.path.trim());
    Ok(())
}

fn print_note(note: &Note) {
    println!("# {}", note.title());
    println!();
    println!(
        "Path: {}  Created: {}  Modified: {}",
        note.path(),
        note.created().format("%Y-%m-%d"),
        note.modified().format("%Y-%m-%d")
    );
    if !note.tags().is_empty() {
        println!("Tags: {}", note.tags().join(", "));
    }
    println!();
    if !note.content().is_empty() {
        println!("{}", note.content().trim_end());
    }
}

fn default_title(path: &str) -> String {
    path.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}
