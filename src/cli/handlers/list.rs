//! List, search and tag command handlers.

use anyhow::{Context, Result};

use super::truncate_str;
use crate::cli::output::{NoteListing, Output, OutputFormat, TagListing};
use crate::cli::{ListArgs, SearchArgs, TaggedArgs, TagsArgs};
use crate::domain::Note;
use crate::service::NoteService;

pub fn handle_list(args: &ListArgs, service: &NoteService) -> Result<()> {
    let paths = match &args.folder {
        Some(folder) => service
            .list_notes_in_folder(folder)
            .with_context(|| format!("failed to list folder '{}'", folder))?,
        None => service.list_notes().context("failed to list notes")?,
    };

    if let OutputFormat::Paths = args.format {
        for path in &paths {
            println!("{}", path);
        }
        return Ok(());
    }

    let notes = paths
        .iter()
        .map(|path| service.read(path))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read notes")?;
    print_notes(&notes, args.format, "No notes found.")
}

pub fn handle_search(args: &SearchArgs, service: &NoteService) -> Result<()> {
    let mut notes = service
        .search(&args.query)
        .with_context(|| format!("search failed for '{}'", args.query))?;
    if let Some(limit) = args.limit {
        notes.truncate(limit);
    }
    print_notes(
        &notes,
        args.format,
        &format!("No notes found matching '{}'.", args.query),
    )
}

pub fn handle_tags(args: &TagsArgs, service: &NoteService) -> Result<()> {
    let counts = service.list_tags().context("failed to list tags")?;
    let mut tags: Vec<TagListing> = counts
        .into_iter()
        .map(|(name, count)| TagListing { name, count })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    match args.format {
        OutputFormat::Human => {
            if tags.is_empty() {
                println!("No tags found.");
            }
            for tag in &tags {
                println!("{} ({})", tag.name, tag.count);
            }
        }
        OutputFormat::Json => Output::new(&tags).print()?,
        OutputFormat::Paths => {
            for tag in &tags {
                println!("{}", tag.name);
            }
        }
    }
    Ok(())
}

pub fn handle_tagged(args: &TaggedArgs, service: &NoteService) -> Result<()> {
    let notes = service
        .find_by_tag(&args.tag)
        .with_context(|| format!("failed to find notes tagged '{}'", args.tag))?;
    print_notes(
        &notes,
        args.format,
        &format!("No notes found with tag '{}'.", args.tag),
    )
}

fn print_notes(notes: &[Note], format: OutputFormat, empty: &str) -> Result<()> {
    match format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("{}", empty);
                return Ok(());
            }
            println!("{:<40}  {:<40}  {:>10}", "Path", "Title", "Modified");
            println!("{:<40}  {:<40}  {:>10}", "-".repeat(40), "-".repeat(40), "-".repeat(10));
            for note in notes {
                println!(
                    "{:<40}  {:<40}  {:>10}",
                    truncate_str(note.path(), 40),
                    truncate_str(note.title(), 40),
                    note.modified().format("%Y-%m-%d")
                );
            }
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = notes.iter().map(NoteListing::from).collect();
            Output::new(listings).print()?;
        }
        OutputFormat::Paths => {
            for note in notes {
                println!("{}", note.path());
            }
        }
    }
    Ok(())
}
