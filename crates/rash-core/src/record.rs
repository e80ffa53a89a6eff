//! The command record — one captured shell command execution.
//!
//! This is both the shape of the JSON documents written by the shell-hook
//! recorder and the shape returned by search, so a record produced by search
//! can be fed straight back into import.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// One recorded command execution.
///
/// Every field is optional: an absent field means "not captured", which the
/// store persists as NULL rather than a default value. Timestamps are epoch
/// seconds on the wire and UTC instants in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub command:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cwd:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub terminal:   Option<String>,
  #[serde(
    default,
    with = "chrono::serde::ts_seconds_option",
    skip_serializing_if = "Option::is_none"
  )]
  pub start:      Option<DateTime<Utc>>,
  #[serde(
    default,
    with = "chrono::serde::ts_seconds_option",
    skip_serializing_if = "Option::is_none"
  )]
  pub stop:       Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exit_code:  Option<i64>,
  /// Environment snapshot taken at capture time. Entries with a null value
  /// are tolerated on input and skipped by the importer.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub environ:    BTreeMap<String, Option<String>>,
  /// Per-stage exit codes of a pipeline, in pipeline order.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub pipestatus: Vec<i64>,
  /// Session identity assigned by the `init` capture hook. Carried through
  /// the capture format; not persisted by the store.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub session_id: Option<String>,
}

impl CommandRecord {
  pub fn from_json(raw: &str) -> Result<Self> {
    Ok(serde_json::from_str(raw)?)
  }

  pub fn to_json(&self) -> Result<String> {
    Ok(serde_json::to_string(self)?)
  }
}
