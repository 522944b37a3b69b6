//! notevault - versioned markdown notes with full-text search and backlinks

pub mod cli;
pub mod config;
pub mod domain;
pub mod index;
pub mod infra;
pub mod migrate;
pub mod service;
pub mod tools;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{
    Cli, Command,
    handlers::{
        handle_backlinks, handle_check, handle_clear, handle_diff, handle_edit, handle_history,
        handle_init, handle_list, handle_migrate, handle_new, handle_rebuild, handle_rm,
        handle_search, handle_show, handle_tagged, handle_tags, handle_tool,
    },
};
use config::Config;
use service::NoteService;

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Completions(args) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(args.shell, &mut cmd, "notevault", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &cli.dir {
        config.notes_dir = dir.clone();
    }
    let author = cli
        .author
        .clone()
        .unwrap_or_else(|| config.default_author.clone());

    let service = NoteService::new(&config);
    match &cli.command {
        Command::Init => handle_init(&config),
        Command::Migrate(args) => handle_migrate(args, &mut config),
        Command::New(args) => handle_new(args, &service, &author),
        Command::Show(args) => handle_show(args, &service),
        Command::Edit(args) => handle_edit(args, &service, &author),
        Command::Rm(args) => handle_rm(args, &service, &author),
        Command::Ls(args) => handle_list(args, &service),
        Command::Search(args) => handle_search(args, &service),
        Command::Tags(args) => handle_tags(args, &service),
        Command::Tagged(args) => handle_tagged(args, &service),
        Command::Backlinks(args) => handle_backlinks(args, &service),
        Command::History(args) => handle_history(args, &service),
        Command::Diff(args) => handle_diff(args, &service),
        Command::Rebuild => handle_rebuild(&service),
        Command::Check => handle_check(&service),
        Command::Clear(args) => handle_clear(args, &service, &author),
        Command::Tool(args) => handle_tool(args, &service),
        Command::Completions(_) => Ok(()),
    }
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins; otherwise each `-v` raises the level from `warn`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
