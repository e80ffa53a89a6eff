//! Conversions between domain values and the plain-text representations
//! stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings, so the
//! lexicographic ordering SQLite applies to `start_time` is chronological.
//! Directories are normalized before they are used as a dimension key.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use rash_core::record::CommandRecord;

use crate::{Error, Result};

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Directory normalization ─────────────────────────────────────────────────

/// Canonicalize a path lexically: resolve it against the current working
/// directory if relative, collapse `.` and `..` components, and strip any
/// trailing separator. Two spellings of the same directory must map to the
/// same dimension key; the filesystem is never consulted.
pub fn normalize_directory(path: &str) -> String {
  let path = Path::new(path);
  let absolute = if path.is_absolute() {
    path.to_path_buf()
  } else {
    std::env::current_dir()
      .map(|cwd| cwd.join(path))
      .unwrap_or_else(|_| path.to_path_buf())
  };

  let mut normalized = PathBuf::new();
  for component in absolute.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        normalized.pop();
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized.to_string_lossy().into_owned()
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw column values read from one search result row.
pub struct RawRecord {
  pub command:    Option<String>,
  pub directory:  Option<String>,
  pub terminal:   Option<String>,
  pub start_time: Option<String>,
  pub stop_time:  Option<String>,
  pub exit_code:  Option<i64>,
}

impl RawRecord {
  pub fn into_record(self) -> Result<CommandRecord> {
    Ok(CommandRecord {
      command: self.command,
      cwd: self.directory,
      terminal: self.terminal,
      start: self.start_time.as_deref().map(decode_dt).transpose()?,
      stop: self.stop_time.as_deref().map(decode_dt).transpose()?,
      exit_code: self.exit_code,
      ..CommandRecord::default()
    })
  }
}
