//! `rash` — record and search shell command history.
//!
//! # Usage
//!
//! ```
//! rash record --command "git status" --exit-code 0 --start 1700000000
//! rash import
//! rash search -n 20 --unique "git *"
//! rash export --format bash | head
//! ```

mod capture;
mod config;
mod export;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use rash_core::store::{HistoryStore as _, ImportOutcome, SearchQuery};
use rash_store_sqlite::SqliteStore;

use crate::config::ConfigStore;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rash", about = "Shell command history recorder and search")]
struct Cli {
  /// Data directory (database and capture files). Defaults to ~/.config/rash.
  #[arg(long, env = "RASH_DATA_DIR", value_name = "DIR")]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Write one capture file; called from shell hooks.
  Record(capture::RecordArgs),
  /// Import capture files into the database.
  Import {
    /// Insert records even when an identical one is already stored.
    #[arg(long)]
    no_check_duplicate: bool,
  },
  /// Search stored history.
  Search(SearchArgs),
  /// Export stored history to another history format.
  Export(export::ExportArgs),
}

#[derive(clap::Args)]
struct SearchArgs {
  /// Maximum number of rows to print.
  #[arg(short = 'n', long, default_value_t = 10)]
  limit: i64,

  /// Only show commands run in this exact directory (repeatable).
  #[arg(short = 'd', long = "cwd")]
  cwd: Vec<String>,

  /// Glob pattern over working directories (repeatable).
  #[arg(long = "cwd-glob")]
  cwd_glob: Vec<String>,

  /// Show each command text once, ranked by its most recent run.
  #[arg(short, long)]
  unique: bool,

  /// Prefix each line with the start time as epoch seconds.
  #[arg(short = 't', long)]
  with_time: bool,

  /// Glob patterns matched against the command text.
  patterns: Vec<String>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = ConfigStore::new(cli.data_dir)?;

  match cli.command {
    Command::Record(args) => capture::run(&config, args),
    Command::Import { no_check_duplicate } => {
      import_captures(&config, !no_check_duplicate).await
    }
    Command::Search(args) => run_search(&config, args).await,
    Command::Export(args) => export::run(&config, args).await,
  }
}

// ─── Subcommands ──────────────────────────────────────────────────────────────

async fn import_captures(
  config: &ConfigStore,
  check_duplicate: bool,
) -> Result<()> {
  let store = SqliteStore::open(config.db_path())
    .await
    .context("opening history database")?;

  let mut imported = 0usize;
  let mut skipped = 0usize;
  for path in config.capture_files().context("listing capture files")? {
    let raw = std::fs::read_to_string(&path)
      .with_context(|| format!("reading {}", path.display()))?;
    let record = match rash_core::record::CommandRecord::from_json(&raw) {
      Ok(record) => record,
      Err(err) => {
        tracing::warn!("ignoring invalid capture file {}: {err}", path.display());
        continue;
      }
    };
    match store.import(record, check_duplicate).await? {
      ImportOutcome::Inserted => imported += 1,
      ImportOutcome::SkippedDuplicate => skipped += 1,
    }
  }

  tracing::info!("imported {imported} records ({skipped} duplicates skipped)");
  Ok(())
}

async fn run_search(config: &ConfigStore, args: SearchArgs) -> Result<()> {
  let store = SqliteStore::open(config.db_path())
    .await
    .context("opening history database")?;

  let query = SearchQuery {
    limit: args.limit,
    patterns: args.patterns,
    cwd_glob: args.cwd_glob,
    cwd: args.cwd,
    unique: args.unique,
  };

  for record in store.search(&query).await? {
    let Some(command) = record.command else {
      continue;
    };
    if args.with_time {
      let start = record.start.map(|t| t.timestamp()).unwrap_or(0);
      println!("{start}\t{command}");
    } else {
      println!("{command}");
    }
  }
  Ok(())
}
