mod app;
mod config;
mod search;
mod session;
mod store;
mod theme;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use crate::search::Ranker;
use crate::session::{Session, SessionOptions};
use crate::store::{CommandStore, FileStore};
use crate::theme::Theme;

#[derive(Debug, Parser)]
#[command(name = "mnemo", version, about = "Interactive picker for remembered shell commands")]
struct Cli {
    /// Record a command without opening the picker
    #[arg(long, value_name = "COMMAND")]
    add: Option<String>,

    /// Comma-separated tags applied when --add creates a new record
    #[arg(long, value_name = "TAGS")]
    tags: Option<String>,

    /// Write the selected command to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// List stored commands and exit
    #[arg(long)]
    list: bool,

    /// Override config path. If omitted, mnemo reads <config dir>/mnemo/config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial query for the picker
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let command_file = config.command_file()?;
    let store = match FileStore::open(command_file.clone()) {
        Ok(store) => store,
        Err(err) => {
            // A broken store file should not block the picker; start empty
            // and let the next successful commit rewrite it.
            log::warn!("could not load commands: {err:#}");
            FileStore::new(command_file)
        }
    };

    if cli.list {
        list_commands(&store);
        return Ok(());
    }

    if let Some(text) = &cli.add {
        let tags = parse_tags(cli.tags.as_deref());
        store.record_usage(text, &tags)?;
        println!("Command added.");
        return Ok(());
    }

    let initial_query = cli.query.join(" ");
    let mut session = Session::new(
        &store,
        Ranker::new(config.fuzzy_search),
        SessionOptions {
            ghost_text: config.ghost_text,
            suggestion_limit: config.suggestion_limit,
        },
        &initial_query,
    );
    let theme = Theme::named(&config.theme);

    let Some(output) = app::run_tui(&mut session, &theme)? else {
        return Ok(());
    };

    match &cli.out {
        Some(path) => fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{output}"),
    }

    Ok(())
}

fn list_commands(store: &FileStore) {
    let records = store.get_all();
    if records.is_empty() {
        println!("No commands stored.");
        return;
    }

    println!("{:<30} {:<20} {}", "COMMAND", "TAGS", "FREQUENCY");
    println!("{}", "-".repeat(60));
    for record in records {
        println!(
            "{:<30} {:<20} {}",
            record.text,
            record.tags.join(", "),
            record.frequency
        );
    }
}

fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
