//! Export stored history to other shell history formats.

use std::io::{self, ErrorKind, Write};

use anyhow::{Context as _, Result};
use clap::ValueEnum;

use rash_core::{
  record::CommandRecord,
  store::{HistoryStore as _, SearchQuery},
};
use rash_store_sqlite::SqliteStore;

use crate::config::ConfigStore;

/// Formats `rash export` can produce. Anything else is rejected during
/// argument parsing, before any I/O happens.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
  /// Bash history with `#<epoch>` timestamp lines (HISTTIMEFORMAT style).
  Bash,
}

#[derive(clap::Args)]
pub struct ExportArgs {
  /// Output format.
  #[arg(short, long, value_enum)]
  format: ExportFormat,

  /// Output file; `-` writes to stdout.
  #[arg(default_value = "-")]
  output: String,
}

pub async fn run(config: &ConfigStore, args: ExportArgs) -> Result<()> {
  let store = SqliteStore::open(config.db_path())
    .await
    .context("opening history database")?;
  // Full scan; the store already orders by start time, oldest first.
  let records = store.search(&SearchQuery::default()).await?;

  match args.output.as_str() {
    "-" => {
      let stdout = io::stdout();
      write_export(args.format, &records, &mut stdout.lock())
    }
    path => {
      let file = std::fs::File::create(path)
        .with_context(|| format!("creating {path}"))?;
      write_export(args.format, &records, &mut io::BufWriter::new(file))
    }
  }
}

fn write_export(
  format: ExportFormat,
  records: &[CommandRecord],
  sink: &mut impl Write,
) -> Result<()> {
  let result = match format {
    ExportFormat::Bash => write_bash(records, sink),
  };
  match result {
    // A closed sink (e.g. piped into `head`) ends the export cleanly.
    Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
    other => Ok(other?),
  }
}

/// Bash extended history: a `#<epoch>` line before each non-empty command,
/// oldest first, readable back by bash when HISTTIMEFORMAT is set.
fn write_bash(
  records: &[CommandRecord],
  sink: &mut impl Write,
) -> io::Result<()> {
  for record in records {
    let Some(command) = record.command.as_deref() else {
      continue;
    };
    if command.is_empty() {
      continue;
    }
    if let Some(start) = record.start {
      writeln!(sink, "#{}", start.timestamp())?;
    }
    writeln!(sink, "{command}")?;
  }
  sink.flush()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rec(command: Option<&str>, start: Option<i64>) -> CommandRecord {
    CommandRecord {
      command: command.map(str::to_string),
      start: start.and_then(|s| chrono::DateTime::from_timestamp(s, 0)),
      ..Default::default()
    }
  }

  #[test]
  fn bash_format_prefixes_timestamps() {
    let records = vec![
      rec(Some("ls"), Some(100)),
      rec(Some("make"), None),
      rec(Some(""), Some(200)),
      rec(None, Some(300)),
    ];

    let mut out = Vec::new();
    write_bash(&records, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "#100\nls\nmake\n");
  }
}
