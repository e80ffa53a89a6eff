//! [`SqliteStore`] — the SQLite implementation of [`HistoryStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use rash_core::{
  record::CommandRecord,
  store::{HistoryStore, ImportOutcome, SearchQuery},
};

use crate::{
  Error, Result,
  encode::{RawRecord, encode_dt, normalize_directory},
  query::compile_search,
  schema::{SCHEMA, SCHEMA_VERSION},
};

// ─── Identity resolution ─────────────────────────────────────────────────────

/// Return the id of the dimension row matching `columns`, inserting the row
/// first if it does not exist.
///
/// This is the single chokepoint through which every dimension table is
/// populated. The select-then-insert pair is only race-free because the store
/// is single-writer; the UNIQUE constraints on the dimension keys back it up
/// should that assumption ever break.
fn resolve_id(
  conn: &rusqlite::Connection,
  table: &str,
  columns: &[(&str, &str)],
) -> rusqlite::Result<i64> {
  let predicate = columns
    .iter()
    .map(|(name, _)| format!("\"{name}\" = ?"))
    .collect::<Vec<_>>()
    .join(" AND ");

  let existing: Option<i64> = conn
    .query_row(
      &format!("SELECT id FROM \"{table}\" WHERE {predicate}"),
      rusqlite::params_from_iter(columns.iter().map(|(_, value)| *value)),
      |row| row.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  let column_list = columns
    .iter()
    .map(|(name, _)| format!("\"{name}\""))
    .collect::<Vec<_>>()
    .join(", ");
  let placeholders = vec!["?"; columns.len()].join(", ");
  conn.execute(
    &format!("INSERT INTO \"{table}\" ({column_list}) VALUES ({placeholders})"),
    rusqlite::params_from_iter(columns.iter().map(|(_, value)| *value)),
  )?;
  Ok(conn.last_insert_rowid())
}

fn command_id(
  conn: &rusqlite::Connection,
  command: Option<&str>,
) -> rusqlite::Result<Option<i64>> {
  command
    .map(|c| resolve_id(conn, "command_list", &[("command", c)]))
    .transpose()
}

fn directory_id(
  conn: &rusqlite::Connection,
  cwd: Option<&str>,
) -> rusqlite::Result<Option<i64>> {
  cwd
    .map(|d| {
      let normalized = normalize_directory(d);
      resolve_id(conn, "directory_list", &[("directory", &normalized)])
    })
    .transpose()
}

fn terminal_id(
  conn: &rusqlite::Connection,
  terminal: Option<&str>,
) -> rusqlite::Result<Option<i64>> {
  terminal
    .map(|t| resolve_id(conn, "terminal_list", &[("terminal", t)]))
    .transpose()
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

/// Null-safe lookup for an already-stored record with the same command,
/// directory, terminal and timestamps. `IS` instead of `=` so that absent
/// dimensions compare equal to absent dimensions.
fn find_existing(
  conn: &rusqlite::Connection,
  record: &CommandRecord,
) -> rusqlite::Result<Option<i64>> {
  let directory = record.cwd.as_deref().map(normalize_directory);
  conn
    .query_row(
      "SELECT command_history.id \
       FROM command_history \
       LEFT JOIN command_list AS CL ON command_id = CL.id \
       LEFT JOIN directory_list AS DL ON directory_id = DL.id \
       LEFT JOIN terminal_list AS TL ON terminal_id = TL.id \
       WHERE CL.command IS ?1 \
         AND DL.directory IS ?2 \
         AND TL.terminal IS ?3 \
         AND start_time IS ?4 \
         AND stop_time IS ?5",
      rusqlite::params![
        record.command,
        directory,
        record.terminal,
        record.start.map(encode_dt),
        record.stop.map(encode_dt),
      ],
      |row| row.get(0),
    )
    .optional()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rash history store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. One
/// connection is held per instance and reused for every operation; it is
/// released when the last clone is dropped.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open a store at `path`. The schema and the `rash_info` version row are
  /// written only when the file does not already exist; an existing file is
  /// used as-is, with no version check or migration.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let fresh = !path.as_ref().exists();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    if fresh {
      store.init_schema().await?;
    } else {
      // foreign_keys is per-connection, unlike the WAL journal mode.
      store
        .conn
        .call(|conn| {
          conn.execute_batch("PRAGMA foreign_keys = ON;")?;
          Ok(())
        })
        .await?;
    }
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
          "INSERT INTO rash_info (rash_version, schema_version) VALUES (?1, ?2)",
          rusqlite::params![env!("CARGO_PKG_VERSION"), SCHEMA_VERSION],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl HistoryStore for SqliteStore {
  type Error = Error;

  async fn import(
    &self,
    record: CommandRecord,
    check_duplicate: bool,
  ) -> Result<ImportOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if check_duplicate && find_existing(&tx, &record)?.is_some() {
          return Ok(ImportOutcome::SkippedDuplicate);
        }

        let command_id = command_id(&tx, record.command.as_deref())?;
        let directory_id = directory_id(&tx, record.cwd.as_deref())?;
        let terminal_id = terminal_id(&tx, record.terminal.as_deref())?;

        tx.execute(
          "INSERT INTO command_history \
             (command_id, directory_id, terminal_id, start_time, stop_time, exit_code) \
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            command_id,
            directory_id,
            terminal_id,
            record.start.map(encode_dt),
            record.stop.map(encode_dt),
            record.exit_code,
          ],
        )?;
        let ch_id = tx.last_insert_rowid();

        for (name, value) in &record.environ {
          let Some(value) = value else { continue };
          let ev_id = resolve_id(
            &tx,
            "environment_variable",
            &[
              ("variable_name", name.as_str()),
              ("variable_value", value.as_str()),
            ],
          )?;
          tx.execute(
            "INSERT INTO command_environment_map (ch_id, ev_id) VALUES (?1, ?2)",
            rusqlite::params![ch_id, ev_id],
          )?;
        }

        for (position, code) in record.pipestatus.iter().enumerate() {
          tx.execute(
            "INSERT INTO pipe_status_map (ch_id, program_position, exit_code) \
             VALUES (?1, ?2, ?3)",
            rusqlite::params![ch_id, position as i64, code],
          )?;
        }

        tx.commit()?;
        Ok(ImportOutcome::Inserted)
      })
      .await?;

    Ok(outcome)
  }

  async fn search(&self, query: &SearchQuery) -> Result<Vec<CommandRecord>> {
    let (sql, params) = compile_search(query);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawRecord {
              command:    row.get(0)?,
              directory:  row.get(1)?,
              terminal:   row.get(2)?,
              start_time: row.get(3)?,
              stop_time:  row.get(4)?,
              exit_code:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}
