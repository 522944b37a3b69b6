//! Backlinks and check command handlers.

use anyhow::{Context, Result, bail};

use super::format_lines;
use crate::cli::BacklinksArgs;
use crate::cli::output::{Output, OutputFormat};
use crate::service::NoteService;

pub fn handle_backlinks(args: &BacklinksArgs, service: &NoteService) -> Result<()> {
    if args.outgoing {
        let targets = service
            .outgoing_links(&args.path)
            .with_context(|| format!("failed to read links from '{}'", args.path))?;
        match args.format {
            OutputFormat::Json => Output::new(&targets).print()?,
            _ if targets.is_empty() => println!("No links from '{}'.", args.path),
            _ => {
                for target in &targets {
                    println!("{}", target);
                }
            }
        }
        return Ok(());
    }

    let backlinks = service
        .backlinks(&args.path)
        .with_context(|| format!("failed to read backlinks of '{}'", args.path))?;
    match args.format {
        OutputFormat::Human => {
            if backlinks.is_empty() {
                println!("No backlinks to '{}'.", args.path);
            }
            for backlink in &backlinks {
                println!(
                    "{} ({})",
                    backlink.source_path,
                    format_lines(&backlink.line_numbers)
                );
            }
        }
        OutputFormat::Json => Output::new(&backlinks).print()?,
        OutputFormat::Paths => {
            for backlink in &backlinks {
                println!("{}", backlink.source_path);
            }
        }
    }
    Ok(())
}

pub fn handle_check(service: &NoteService) -> Result<()> {
    let broken = service
        .broken_links()
        .context("failed to check links")?;

    if broken.is_empty() {
        println!("All links OK.");
        return Ok(());
    }

    for (source, target) in &broken {
        println!("broken link: {} -> [[{}]]", source, target);
    }
    bail!("found {} broken link(s)", broken.len());
}
