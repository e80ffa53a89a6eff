//! The `rash record` capture shim, called from shell hooks.
//!
//! Writes one JSON document per captured event under
//! `<data_dir>/record/<type>/<date>/<time>.json`. The database never sees
//! these files until `rash import` runs, so the hook stays fast and cannot
//! corrupt the store.

use std::collections::BTreeMap;

use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use clap::ValueEnum;

use rash_core::record::CommandRecord;

use crate::config::ConfigStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordType {
  Command,
  Init,
  Exit,
}

impl RecordType {
  fn as_str(self) -> &'static str {
    match self {
      Self::Command => "command",
      Self::Init => "init",
      Self::Exit => "exit",
    }
  }

  /// Environment variables snapshotted for this record type.
  fn environ_keys(self) -> &'static [&'static str] {
    match self {
      Self::Init => &["SHELL", "TERM", "HOST", "TTY", "USER", "DISPLAY"],
      Self::Command => &["PATH"],
      Self::Exit => &[],
    }
  }
}

impl std::fmt::Display for RecordType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(clap::Args)]
pub struct RecordArgs {
  /// Type of record to store.
  #[arg(long, value_enum, default_value_t = RecordType::Command)]
  record_type: RecordType,

  /// Command that was run.
  #[arg(long)]
  command: Option<String>,

  /// Exit code $? of the command.
  #[arg(long)]
  exit_code: Option<i64>,

  /// $pipestatus (zsh) / $PIPESTATUS (bash).
  #[arg(long, num_args = 1..)]
  pipestatus: Vec<i64>,

  /// The time the command was started, as epoch seconds.
  #[arg(long)]
  start: Option<i64>,

  /// The time the command finished, as epoch seconds.
  #[arg(long)]
  stop: Option<i64>,

  /// Like $TERM, but can be anything (e.g. emacs / tmux).
  #[arg(long)]
  terminal: Option<String>,

  /// Session ID generated by --print-session-id.
  #[arg(long)]
  session_id: Option<String>,

  /// Print the generated session ID to stdout; only valid with
  /// --record-type=init.
  #[arg(long)]
  print_session_id: bool,
}

pub fn run(config: &ConfigStore, args: RecordArgs) -> Result<()> {
  if args.print_session_id && args.record_type != RecordType::Init {
    bail!("--print-session-id is only valid with --record-type=init");
  }

  let now = Utc::now();
  let mut record = CommandRecord {
    command: args.command,
    cwd: std::env::current_dir()
      .ok()
      .map(|p| p.to_string_lossy().into_owned()),
    terminal: args.terminal,
    start: args
      .start
      .and_then(|s| chrono::DateTime::from_timestamp(s, 0)),
    stop: args
      .stop
      .and_then(|s| chrono::DateTime::from_timestamp(s, 0)),
    exit_code: args.exit_code,
    environ: capture_environ(args.record_type.environ_keys()),
    pipestatus: args.pipestatus,
    session_id: args.session_id,
  };

  match args.record_type {
    RecordType::Command | RecordType::Exit => {
      record.stop.get_or_insert(now);
    }
    RecordType::Init => {
      record.start.get_or_insert(now);
    }
  }

  if args.print_session_id {
    let id = session_id(&record);
    record.session_id = Some(id.clone());
    println!("{id}");
  }

  let dir = config
    .record_dir()
    .join(args.record_type.as_str())
    .join(now.format("%Y-%m-%d").to_string());
  std::fs::create_dir_all(&dir)
    .with_context(|| format!("creating {}", dir.display()))?;
  let path = dir.join(now.format("%H%M%S%.6f.json").to_string());
  std::fs::write(&path, record.to_json()?)
    .with_context(|| format!("writing {}", path.display()))?;

  tracing::debug!("captured {} record at {}", args.record_type.as_str(), path.display());
  Ok(())
}

/// Snapshot the requested variables. HOST and TTY are not exported by every
/// shell, so they get fallbacks.
fn capture_environ(keys: &[&str]) -> BTreeMap<String, Option<String>> {
  let mut environ = BTreeMap::new();
  for &key in keys {
    if let Ok(value) = std::env::var(key) {
      environ.insert(key.to_string(), Some(value));
    }
  }
  if keys.contains(&"HOST") && !environ.contains_key("HOST") {
    if let Some(host) = hostname() {
      environ.insert("HOST".into(), Some(host));
    }
  }
  if keys.contains(&"TTY") && !environ.contains_key("TTY") {
    if let Ok(tty) = std::env::var("SSH_TTY") {
      environ.insert("TTY".into(), Some(tty));
    }
  }
  environ
}

fn hostname() -> Option<String> {
  std::env::var("HOSTNAME").ok().or_else(|| {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
      .ok()
      .map(|s| s.trim().to_string())
  })
}

/// Session IDs identify one shell instance: host, tty, the shell's pid (our
/// parent) and the shell start time.
fn session_id(record: &CommandRecord) -> String {
  let get = |key: &str| record.environ.get(key).and_then(|v| v.clone());
  let host = get("HOST").unwrap_or_else(|| "NO_HOST".into());
  let tty = get("TTY").unwrap_or_else(|| "NO_TTY".into());
  let ppid = std::os::unix::process::parent_id();
  let start = record.start.map(|t| t.timestamp()).unwrap_or(0);
  format!("{host}:{tty}:{ppid}:{start}")
}
