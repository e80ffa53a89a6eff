//! Search SQL compilation.
//!
//! A [`SearchQuery`] is compiled into one statement with positionally bound
//! parameters. Clause emission order and parameter order agree by
//! construction: command glob patterns, then directory glob patterns, then
//! exact directories, and the limit value last. Alternatives within one
//! category are ORed and parenthesized; categories are ANDed.

use rusqlite::types::Value;

use rash_core::store::SearchQuery;

use crate::encode::normalize_directory;

/// Compile `query` into SQL plus its bound parameters, in binding order.
///
/// The statement always outer-joins the three dimension tables, so a history
/// row whose dimension reference is NULL still appears with a NULL column.
pub fn compile_search(query: &SearchQuery) -> (String, Vec<Value>) {
  let mut conditions: Vec<String> = vec![];
  let mut params: Vec<Value> = vec![];

  any_of(
    &mut conditions,
    &mut params,
    "glob(?, CL.command)",
    query.patterns.clone(),
  );
  any_of(
    &mut conditions,
    &mut params,
    "glob(?, DL.directory)",
    query.cwd_glob.clone(),
  );
  any_of(
    &mut conditions,
    &mut params,
    "DL.directory = ?",
    query.cwd.iter().map(|d| normalize_directory(d)).collect(),
  );

  let where_clause = if conditions.is_empty() {
    String::new()
  } else {
    format!("WHERE {} ", conditions.join(" AND "))
  };

  // With `unique`, repeated command texts collapse to one row each and the
  // group's most recent start time is the one that sorts it.
  let (start_column, group_by) = if query.unique {
    ("MAX(start_time) AS start_time", "GROUP BY CL.command ")
  } else {
    ("start_time", "")
  };

  let sql = format!(
    "SELECT CL.command, DL.directory, TL.terminal, {start_column}, stop_time, exit_code \
     FROM command_history \
     LEFT JOIN command_list AS CL ON command_id = CL.id \
     LEFT JOIN directory_list AS DL ON directory_id = DL.id \
     LEFT JOIN terminal_list AS TL ON terminal_id = TL.id \
     {where_clause}{group_by}ORDER BY start_time LIMIT ?"
  );
  params.push(Value::from(query.limit));

  (sql, params)
}

/// Append one parenthesized OR group for a filter category, or nothing when
/// the category has no accepted values.
fn any_of(
  conditions: &mut Vec<String>,
  params: &mut Vec<Value>,
  clause: &str,
  values: Vec<String>,
) {
  if values.is_empty() {
    return;
  }
  let alternatives = vec![clause; values.len()].join(" OR ");
  conditions.push(format!("({alternatives})"));
  params.extend(values.into_iter().map(Value::from));
}
