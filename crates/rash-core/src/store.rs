//! The `HistoryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `rash-store-sqlite`).
//! The CLI depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::record::CommandRecord;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`HistoryStore::search`].
#[derive(Debug, Clone)]
pub struct SearchQuery {
  /// Maximum number of rows returned. A negative value means no cap
  /// (SQLite `LIMIT` semantics).
  pub limit:    i64,
  /// Glob patterns matched against the command text; alternatives within
  /// the category are ORed together.
  pub patterns: Vec<String>,
  /// Glob patterns matched against the normalized working directory.
  pub cwd_glob: Vec<String>,
  /// Exact working directories; each is normalized before comparison.
  pub cwd:      Vec<String>,
  /// Collapse repeated command texts to one row each, ranked by the most
  /// recent start time.
  pub unique:   bool,
}

impl Default for SearchQuery {
  fn default() -> Self {
    Self {
      limit:    -1,
      patterns: vec![],
      cwd_glob: vec![],
      cwd:      vec![],
      unique:   false,
    }
  }
}

// ─── Import outcome ──────────────────────────────────────────────────────────

/// Whether an import wrote anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
  Inserted,
  /// Duplicate checking was requested and an identical record was already
  /// stored; nothing was written.
  SkippedDuplicate,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a rash history store backend.
///
/// Writes are append-only: history rows are created once and never updated
/// or deleted. All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait HistoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist one record: dimension values are normalized into their lookup
  /// tables, then the fact row and its join rows are inserted in a single
  /// transaction. With `check_duplicate`, an already-stored identical record
  /// makes this a no-op.
  fn import(
    &self,
    record: CommandRecord,
    check_duplicate: bool,
  ) -> impl Future<Output = Result<ImportOutcome, Self::Error>> + Send + '_;

  /// Search stored history. Results are ordered by start time ascending and
  /// bounded by `query.limit`. Each call compiles and runs a fresh statement;
  /// nothing is cached across calls.
  fn search<'a>(
    &'a self,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<CommandRecord>, Self::Error>> + Send + 'a;
}
