//! Init, rebuild, migrate and clear command handlers.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

use crate::cli::{ClearArgs, MigrateArgs};
use crate::config::{Config, REQUIRED_DATA_VERSION};
use crate::migrate::{ensure_repository, run_migrations};
use crate::service::NoteService;

pub fn handle_init(config: &Config) -> Result<()> {
    if !config.path().exists() {
        config
            .save()
            .with_context(|| format!("failed to write config to {}", config.path().display()))?;
        println!("Wrote config: {}", config.path().display());
    }

    let created = ensure_repository(config).context("failed to initialize repository")?;
    if created {
        println!("Initialized notes repository at {}", config.notes_dir.display());
    } else {
        println!(
            "Notes repository already initialized at {}",
            config.notes_dir.display()
        );
    }
    Ok(())
}

pub fn handle_rebuild(service: &NoteService) -> Result<()> {
    println!("Rebuilding indexes...");
    let result = service
        .rebuild_indexes()
        .context("failed to rebuild indexes")?;

    for (path, error) in &result.errors {
        eprintln!("  error: {}: {}", path, error);
    }
    println!("Done! Processed {} notes.", result.notes_processed);
    Ok(())
}

pub fn handle_migrate(args: &MigrateArgs, config: &mut Config) -> Result<()> {
    ensure_repository(config).context("failed to initialize repository")?;
    let service = NoteService::new(config);

    if !config.needs_migration() {
        println!("Data is already at version {}.", config.data_version);
        return Ok(());
    }

    if args.dry_run {
        let overlaps = service
            .find_overlapping_notes()
            .context("failed to inspect notes")?;
        println!(
            "Would migrate data from version {} to {}.",
            config.data_version, REQUIRED_DATA_VERSION
        );
        for (old, new) in &overlaps {
            println!("  would move: {} -> {}", old, new);
        }
        return Ok(());
    }

    let from = config.data_version;
    let result = run_migrations(config, &service).context("migration failed")?;
    for (old, new) in &result.notes_moved {
        println!("  moved: {} -> {}", old, new);
    }
    let result = result
        .into_outcome()
        .with_context(|| format!("migration from version {} did not complete", from))?;

    println!(
        "Migrated data from version {} to {} ({} notes moved).",
        result.from_version,
        result.to_version,
        result.notes_moved.len()
    );
    Ok(())
}

pub fn handle_clear(args: &ClearArgs, service: &NoteService, author: &str) -> Result<()> {
    if !args.force {
        println!("WARNING: This will delete ALL notes!");
        print!("Type 'yes' to confirm: ");
        io::stdout().flush().context("failed to flush stdout")?;

        let mut response = String::new();
        io::stdin()
            .lock()
            .read_line(&mut response)
            .context("failed to read confirmation")?;
        if !response.trim().eq_ignore_ascii_case("yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let count = service.clear(author).context("failed to clear notes")?;
    println!("Deleted {} notes.", count);
    Ok(())
}
