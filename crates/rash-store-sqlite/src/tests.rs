//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::DateTime;

use rash_core::{
  record::CommandRecord,
  store::{HistoryStore as _, ImportOutcome, SearchQuery},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn record(command: &str, cwd: &str, start: i64) -> CommandRecord {
  CommandRecord {
    command: Some(command.into()),
    cwd: Some(cwd.into()),
    start: DateTime::from_timestamp(start, 0),
    ..Default::default()
  }
}

async fn count(s: &SqliteStore, table: &str) -> i64 {
  let sql = format!("SELECT COUNT(*) FROM {table}");
  s.conn
    .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
    .await
    .unwrap()
}

// ─── Normalization ───────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_dimension_values_share_one_row() {
  let s = store().await;

  s.import(record("ls", "/home", 100), false).await.unwrap();
  s.import(record("ls", "/tmp", 200), false).await.unwrap();
  s.import(record("pwd", "/tmp", 300), false).await.unwrap();

  assert_eq!(count(&s, "command_list").await, 2);
  assert_eq!(count(&s, "directory_list").await, 2);
  assert_eq!(count(&s, "command_history").await, 3);
}

#[tokio::test]
async fn trailing_separator_maps_to_same_directory() {
  let s = store().await;

  s.import(record("ls", "/a/b/", 100), false).await.unwrap();
  s.import(record("ls", "/a/b", 200), false).await.unwrap();

  assert_eq!(count(&s, "directory_list").await, 1);

  let results = s.search(&SearchQuery::default()).await.unwrap();
  assert!(results.iter().all(|r| r.cwd.as_deref() == Some("/a/b")));
}

#[tokio::test]
async fn absent_cwd_stores_null_reference() {
  let s = store().await;

  let rec = CommandRecord {
    command: Some("ls".into()),
    start: DateTime::from_timestamp(100, 0),
    ..Default::default()
  };
  s.import(rec, false).await.unwrap();

  // No empty-string directory row was created.
  assert_eq!(count(&s, "directory_list").await, 0);

  let results = s.search(&SearchQuery::default()).await.unwrap();
  assert_eq!(results.len(), 1);
  assert!(results[0].cwd.is_none());
}

#[tokio::test]
async fn environment_pairs_are_deduplicated() {
  let s = store().await;

  let mut rec = record("ls", "/home", 100);
  rec
    .environ
    .insert("PATH".into(), Some("/usr/bin".into()));
  rec.environ.insert("DISPLAY".into(), None);
  s.import(rec.clone(), false).await.unwrap();

  rec.start = DateTime::from_timestamp(200, 0);
  s.import(rec, false).await.unwrap();

  // One (name, value) pair row, referenced by both history rows; the null
  // value was skipped entirely.
  assert_eq!(count(&s, "environment_variable").await, 1);
  assert_eq!(count(&s, "command_environment_map").await, 2);
}

#[tokio::test]
async fn same_variable_name_with_two_values_gets_two_rows() {
  let s = store().await;

  let mut rec = record("ls", "/home", 100);
  rec
    .environ
    .insert("PATH".into(), Some("/usr/bin".into()));
  s.import(rec, false).await.unwrap();

  let mut rec = record("ls", "/home", 200);
  rec
    .environ
    .insert("PATH".into(), Some("/usr/bin:/opt/bin".into()));
  s.import(rec, false).await.unwrap();

  assert_eq!(count(&s, "environment_variable").await, 2);
}

#[tokio::test]
async fn pipe_statuses_keep_their_positions() {
  let s = store().await;

  let mut rec = record("ls | wc -l", "/home", 100);
  rec.pipestatus = vec![0, 141, 0];
  s.import(rec, false).await.unwrap();

  let rows: Vec<(i64, i64)> = s
    .conn
    .call(|conn| {
      let mut stmt = conn.prepare(
        "SELECT program_position, exit_code FROM pipe_status_map \
         ORDER BY program_position",
      )?;
      let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await
    .unwrap();

  assert_eq!(rows, vec![(0, 0), (1, 141), (2, 0)]);
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_import_leaves_nothing_behind() {
  let s = store().await;

  // Sabotage the join table so the pipe-status step fails mid-import.
  s.conn
    .call(|conn| {
      conn.execute_batch("DROP TABLE pipe_status_map;")?;
      Ok(())
    })
    .await
    .unwrap();

  let mut rec = record("ls", "/home", 100);
  rec.pipestatus = vec![0];
  assert!(s.import(rec, false).await.is_err());

  // The whole transaction rolled back, dimension rows included.
  assert_eq!(count(&s, "command_history").await, 0);
  assert_eq!(count(&s, "command_list").await, 0);
  assert_eq!(count(&s, "directory_list").await, 0);
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unfiltered_search_orders_by_start_ascending() {
  let s = store().await;

  s.import(record("c", "/d", 300), false).await.unwrap();
  s.import(record("a", "/d", 100), false).await.unwrap();
  s.import(record("b", "/d", 200), false).await.unwrap();

  let results = s.search(&SearchQuery::default()).await.unwrap();
  let commands: Vec<_> =
    results.iter().map(|r| r.command.clone().unwrap()).collect();
  assert_eq!(commands, ["a", "b", "c"]);
}

#[tokio::test]
async fn limit_returns_the_earliest_matches() {
  let s = store().await;

  for (i, cmd) in ["a", "b", "c", "d"].iter().enumerate() {
    s.import(record(cmd, "/d", (i as i64 + 1) * 100), false)
      .await
      .unwrap();
  }

  let results = s
    .search(&SearchQuery {
      limit: 2,
      ..Default::default()
    })
    .await
    .unwrap();
  let commands: Vec<_> =
    results.iter().map(|r| r.command.clone().unwrap()).collect();
  assert_eq!(commands, ["a", "b"]);
}

#[tokio::test]
async fn glob_patterns_filter_command_text() {
  let s = store().await;

  s.import(record("git commit", "/d", 100), false).await.unwrap();
  s.import(record("git push", "/d", 200), false).await.unwrap();
  s.import(record("svn commit", "/d", 300), false).await.unwrap();

  let results = s
    .search(&SearchQuery {
      patterns: vec!["git *".into()],
      ..Default::default()
    })
    .await
    .unwrap();

  let commands: Vec<_> =
    results.iter().map(|r| r.command.clone().unwrap()).collect();
  assert_eq!(commands, ["git commit", "git push"]);
}

#[tokio::test]
async fn patterns_in_one_category_are_alternatives() {
  let s = store().await;

  s.import(record("git push", "/d", 100), false).await.unwrap();
  s.import(record("svn commit", "/d", 200), false).await.unwrap();
  s.import(record("make", "/d", 300), false).await.unwrap();

  let results = s
    .search(&SearchQuery {
      patterns: vec!["git *".into(), "svn *".into()],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn exact_cwd_filter_normalizes_its_argument() {
  let s = store().await;

  s.import(record("ls", "/home/alice", 100), false).await.unwrap();
  s.import(record("ls", "/home/bob", 200), false).await.unwrap();

  let results = s
    .search(&SearchQuery {
      cwd: vec!["/home/alice/".into()],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].cwd.as_deref(), Some("/home/alice"));
}

#[tokio::test]
async fn cwd_glob_filters_directories() {
  let s = store().await;

  s.import(record("ls", "/home/alice/src", 100), false).await.unwrap();
  s.import(record("ls", "/var/log", 200), false).await.unwrap();

  let results = s
    .search(&SearchQuery {
      cwd_glob: vec!["/home/*".into()],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].cwd.as_deref(), Some("/home/alice/src"));
}

#[tokio::test]
async fn filters_from_different_categories_combine_with_and() {
  let s = store().await;

  s.import(record("git push", "/home/alice", 100), false).await.unwrap();
  s.import(record("git push", "/var/log", 200), false).await.unwrap();
  s.import(record("make", "/home/alice", 300), false).await.unwrap();

  let results = s
    .search(&SearchQuery {
      patterns: vec!["git *".into()],
      cwd: vec!["/home/alice".into()],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].start.unwrap().timestamp(), 100);
}

#[tokio::test]
async fn unique_collapses_repeated_commands_to_latest_start() {
  let s = store().await;

  s.import(record("ls", "/home", 100), false).await.unwrap();
  s.import(record("ls", "/home", 200), false).await.unwrap();
  s.import(record("ls", "/home", 150), false).await.unwrap();

  let results = s
    .search(&SearchQuery {
      patterns: vec!["ls".into()],
      unique: true,
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(results.len(), 1);
  assert_eq!(results[0].command.as_deref(), Some("ls"));
  assert_eq!(results[0].start.unwrap().timestamp(), 200);
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_check_skips_identical_records() {
  let s = store().await;

  let rec = record("ls", "/home", 100);
  let first = s.import(rec.clone(), true).await.unwrap();
  let second = s.import(rec.clone(), true).await.unwrap();

  assert_eq!(first, ImportOutcome::Inserted);
  assert_eq!(second, ImportOutcome::SkippedDuplicate);
  assert_eq!(count(&s, "command_history").await, 1);

  // Without the check, the same record imports again.
  let third = s.import(rec, false).await.unwrap();
  assert_eq!(third, ImportOutcome::Inserted);
  assert_eq!(count(&s, "command_history").await, 2);
}

#[tokio::test]
async fn duplicate_check_is_null_safe() {
  let s = store().await;

  let rec = CommandRecord {
    command: Some("ls".into()),
    ..Default::default()
  };
  s.import(rec.clone(), true).await.unwrap();
  let second = s.import(rec, true).await.unwrap();

  assert_eq!(second, ImportOutcome::SkippedDuplicate);
  assert_eq!(count(&s, "command_history").await, 1);
}

#[tokio::test]
async fn different_start_time_is_not_a_duplicate() {
  let s = store().await;

  s.import(record("ls", "/home", 100), true).await.unwrap();
  let second = s.import(record("ls", "/home", 200), true).await.unwrap();

  assert_eq!(second, ImportOutcome::Inserted);
  assert_eq!(count(&s, "command_history").await, 2);
}

// ─── Round trip ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_output_is_valid_import_input() {
  let s = store().await;

  let mut rec = record("ls -la", "/home", 100);
  rec.terminal = Some("xterm".into());
  rec.stop = DateTime::from_timestamp(101, 0);
  rec.exit_code = Some(0);
  s.import(rec, false).await.unwrap();

  let results = s.search(&SearchQuery::default()).await.unwrap();
  assert_eq!(results.len(), 1);
  let found = results.into_iter().next().unwrap();
  assert_eq!(found.command.as_deref(), Some("ls -la"));
  assert_eq!(found.stop.unwrap().timestamp(), 101);
  assert_eq!(found.exit_code, Some(0));

  // Re-import creates a new fact row but no new dimension rows.
  s.import(found, false).await.unwrap();
  assert_eq!(count(&s, "command_history").await, 2);
  assert_eq!(count(&s, "command_list").await, 1);
  assert_eq!(count(&s, "directory_list").await, 1);
  assert_eq!(count(&s, "terminal_list").await, 1);
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_initializes_fresh_files_exactly_once() {
  let path = std::env::temp_dir().join(format!(
    "rash-store-test-{}.sqlite",
    std::process::id()
  ));
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.import(record("ls", "/home", 100), false).await.unwrap();
  }

  // Reopening an existing file skips initialisation and keeps the data.
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(count(&s, "rash_info").await, 1);
  assert_eq!(count(&s, "command_history").await, 1);

  let _ = std::fs::remove_file(&path);
}
