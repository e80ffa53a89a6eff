//! SQL schema for the rash SQLite store.
//!
//! Executed exactly once, when the store file is first created. Existing
//! files are opened as-is; there is no migration path, only the version row
//! recorded in `rash_info` at creation time.

/// Schema version written to `rash_info` alongside the application version.
pub const SCHEMA_VERSION: &str = "0.1";

/// Full schema DDL for a freshly created store.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Dimension tables: one row per distinct value, referenced by id.
CREATE TABLE command_list (
    id      INTEGER PRIMARY KEY,
    command TEXT NOT NULL UNIQUE
);

CREATE TABLE directory_list (
    id        INTEGER PRIMARY KEY,
    directory TEXT NOT NULL UNIQUE   -- normalized absolute path
);

CREATE TABLE terminal_list (
    id       INTEGER PRIMARY KEY,
    terminal TEXT NOT NULL UNIQUE
);

-- Identity is the (name, value) pair: the same variable seen with two
-- values yields two rows.
CREATE TABLE environment_variable (
    id             INTEGER PRIMARY KEY,
    variable_name  TEXT NOT NULL,
    variable_value TEXT NOT NULL,
    UNIQUE (variable_name, variable_value)
);

-- Fact table: one row per executed command, append-only. A NULL reference
-- means the dimension was not recorded for that command.
CREATE TABLE command_history (
    id           INTEGER PRIMARY KEY,
    command_id   INTEGER REFERENCES command_list(id),
    directory_id INTEGER REFERENCES directory_list(id),
    terminal_id  INTEGER REFERENCES terminal_list(id),
    start_time   TEXT,     -- RFC 3339 UTC
    stop_time    TEXT,     -- RFC 3339 UTC
    exit_code    INTEGER
);

CREATE TABLE command_environment_map (
    ch_id INTEGER NOT NULL REFERENCES command_history(id),
    ev_id INTEGER NOT NULL REFERENCES environment_variable(id)
);

CREATE TABLE pipe_status_map (
    ch_id            INTEGER NOT NULL REFERENCES command_history(id),
    program_position INTEGER NOT NULL,   -- 0-based index in the pipeline
    exit_code        INTEGER NOT NULL,
    PRIMARY KEY (ch_id, program_position)
);

-- Written exactly once, at store creation; never read back by this version.
CREATE TABLE rash_info (
    id             INTEGER PRIMARY KEY,
    rash_version   TEXT NOT NULL,
    schema_version TEXT NOT NULL
);

CREATE INDEX command_history_start_idx ON command_history(start_time);
";
