//! [`SqliteStore`] — the SQLite implementation of [`SessionStore`] and
//! [`SubmissionSink`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use ideate_core::{
  session::SurveySession,
  source::Source,
  store::{SessionStore, SubmissionSink},
  submission::SubmissionRecord,
};

use crate::{Error, Result, schema::schema};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Ideate store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
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
    let ddl = schema();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for SqliteStore {
  type Error = Error;

  async fn load(&self, response_id: Uuid) -> Result<Option<SurveySession>> {
    let id_str = response_id.to_string();

    let state_json: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT state_json FROM sessions WHERE response_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    state_json
      .map(|json| serde_json::from_str(&json))
      .transpose()
      .map_err(Error::Json)
  }

  async fn save(&self, session: &SurveySession) -> Result<()> {
    let id_str = session.response_id.to_string();
    let state_json = serde_json::to_string(session)?;
    let at_str = Utc::now().to_rfc3339();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (response_id, updated_at, state_json)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(response_id) DO UPDATE SET
             updated_at = excluded.updated_at,
             state_json = excluded.state_json",
          rusqlite::params![id_str, at_str, state_json],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, response_id: Uuid) -> Result<()> {
    let id_str = response_id.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE response_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SubmissionSink impl ─────────────────────────────────────────────────────

impl SubmissionSink for SqliteStore {
  type Error = Error;

  /// Upsert the finished response into its survey-type table. Keyed by
  /// response id, so a retried submission converges on one row.
  async fn submit(&self, record: &SubmissionRecord) -> Result<()> {
    // The table name comes from the SurveyType enum, never from input.
    let table = record.survey_type.table();

    let selection_columns: Vec<&'static str> =
      Source::iter().map(Source::column).collect();
    let all_columns: Vec<String> = [
      "response_id",
      "start_date",
      "end_date",
      "progress",
      "duration",
      "finished",
      "app_id_selected",
      "app_id_evaluated",
      "prolific_id",
      "familiarity",
    ]
    .into_iter()
    .map(str::to_owned)
    .chain(selection_columns.iter().map(|c| (*c).to_owned()))
    .chain(std::iter::once("recorded_at".to_owned()))
    .collect();

    let placeholders: Vec<String> =
      (1..=all_columns.len()).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = all_columns
      .iter()
      .skip(1) // never rewrite the key
      .map(|c| format!("{c} = excluded.{c}"))
      .collect();

    let sql = format!(
      "INSERT INTO {table} ({}) VALUES ({})
       ON CONFLICT(response_id) DO UPDATE SET {}",
      all_columns.join(", "),
      placeholders.join(", "),
      updates.join(", "),
    );

    let mut values: Vec<rusqlite::types::Value> = vec![
      record.response_id.to_string().into(),
      record.start_date.to_rfc3339().into(),
      record.end_date.to_rfc3339().into(),
      record.progress.into(),
      record.duration_secs.into(),
      record.finished.into(),
      record.app_id_selected.clone().into(),
      record.app_id_evaluated.clone().into(),
      record.prolific_id.clone().into(),
      record.familiarity.into(),
    ];
    for source in Source::iter() {
      let wire = record
        .selections
        .get(&source)
        .cloned()
        .unwrap_or_else(|| "[-1]".to_owned());
      values.push(wire.into());
    }
    values.push(Utc::now().to_rfc3339().into());

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
