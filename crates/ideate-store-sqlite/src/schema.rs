//! SQL schema for the Ideate SQLite store.
//!
//! Executed once at connection startup; idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`. One response table exists per survey type,
//! all with identical columns, so the DDL for that family is generated from
//! the [`SurveyType`] enum rather than written out six times.

use ideate_core::source::{Source, SurveyType};
use strum::IntoEnumIterator as _;

const PRELUDE: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per in-flight participant session: the whole SurveySession value
-- as a JSON snapshot, overwritten on every stage transition and deleted
-- after the terminal submission succeeds.
CREATE TABLE IF NOT EXISTS sessions (
    response_id TEXT PRIMARY KEY,
    updated_at  TEXT NOT NULL,    -- ISO 8601 UTC
    state_json  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_updated_idx ON sessions(updated_at);
";

/// Build the full schema DDL: the prelude plus one response table per
/// survey type. Each selection column holds the legacy JSON array shape
/// (`[-1]` not presented, `[0]` none selected, otherwise idea numbers).
pub fn schema() -> String {
  let mut ddl = String::from(PRELUDE);

  let selection_columns: String = Source::iter()
    .map(|s| format!("    {:16} TEXT NOT NULL DEFAULT '[-1]',\n", s.column()))
    .collect();

  for survey_type in SurveyType::iter() {
    ddl.push_str(&format!(
      "\nCREATE TABLE IF NOT EXISTS {table} (\n\
      \x20   response_id      TEXT PRIMARY KEY,\n\
      \x20   start_date       TEXT NOT NULL,\n\
      \x20   end_date         TEXT NOT NULL,\n\
      \x20   progress         INTEGER NOT NULL,\n\
      \x20   duration         INTEGER NOT NULL,\n\
      \x20   finished         INTEGER NOT NULL,\n\
      \x20   app_id_selected  TEXT NOT NULL,\n\
      \x20   app_id_evaluated TEXT NOT NULL,\n\
      \x20   prolific_id      TEXT NOT NULL,\n\
      \x20   familiarity      INTEGER NOT NULL,\n\
      {selection_columns}\
      \x20   recorded_at      TEXT NOT NULL\n\
      );\n",
      table = survey_type.table(),
    ));
  }

  ddl
}
