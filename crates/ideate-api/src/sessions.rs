//! Handlers for the `/sessions` endpoints — the survey lifecycle.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sessions` | Body: [`NewSessionBody`]; returns 201 + session |
//! | `GET`  | `/sessions/:id` | Resume a stored session |
//! | `POST` | `/sessions/:id/apps` | Body: [`SelectAppsBody`] |
//! | `POST` | `/sessions/:id/frequency` | Body: [`FrequencyBody`] |
//! | `POST` | `/sessions/:id/evaluation/:page` | Body: [`EvaluationBody`] |
//! | `POST` | `/sessions/:id/back` | One stage backwards |
//! | `POST` | `/sessions/:id/complete` | Assemble, submit, delete |
//!
//! Every successful transition persists the session snapshot before the
//! response is returned, so a reload resumes at the committed stage.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use ideate_core::{
  session::{Selection, Stage, SurveySession},
  source::{SurveyType, UsageFrequency},
  store::{SessionStore, SubmissionSink},
  submission::assemble,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Store helpers ───────────────────────────────────────────────────────────

async fn load_session<S>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<SurveySession, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  SessionStore::load(&*state.store, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("session {id} not found")))
}

async fn save_session<S>(
  state: &AppState<S>,
  session: &SurveySession,
) -> Result<(), ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  SessionStore::save(&*state.store, session)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))
}

// ─── Create / resume ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewSessionBody {
  #[serde(default)]
  pub survey_type: SurveyType,
}

/// `POST /sessions` — returns 201 + the fresh session snapshot.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewSessionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let session = SurveySession::new(body.survey_type, Utc::now());
  save_session(&state, &session).await?;
  tracing::info!(
    response_id = %session.response_id,
    survey_type = %session.survey_type,
    "session started"
  );
  Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /sessions/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SurveySession>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  Ok(Json(load_session(&state, id).await?))
}

// ─── App selection ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectAppsBody {
  pub app_ids: Vec<String>,
}

/// `POST /sessions/:id/apps`
pub async fn select_apps<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SelectAppsBody>,
) -> Result<Json<SurveySession>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let mut session = load_session(&state, id).await?;
  session.select_apps(body.app_ids, &mut rand::thread_rng())?;
  save_session(&state, &session).await?;
  Ok(Json(session))
}

// ─── Frequency capture ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FrequencyBody {
  pub prolific_id: String,
  pub frequency:   UsageFrequency,
}

/// `POST /sessions/:id/frequency` — fixes the evaluation page order on the
/// first pass through.
pub async fn capture_frequency<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<FrequencyBody>,
) -> Result<Json<SurveySession>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let mut session = load_session(&state, id).await?;
  let degraded = session.capture_frequency(
    &body.prolific_id,
    body.frequency,
    &state.corpus,
    &mut rand::thread_rng(),
  )?;
  if degraded {
    tracing::warn!(
      response_id = %session.response_id,
      app_id = session.evaluated_app_id.as_deref().unwrap_or(""),
      "no sources available for evaluated app; using default subset"
    );
  }
  save_session(&state, &session).await?;
  Ok(Json(session))
}

// ─── Evaluation pages ────────────────────────────────────────────────────────

/// Exactly one of `none` and `selected` must be given.
#[derive(Debug, Deserialize)]
pub struct EvaluationBody {
  #[serde(default)]
  pub none:     bool,
  pub selected: Option<Vec<u8>>,
}

/// `POST /sessions/:id/evaluation/:page`
pub async fn commit_evaluation<S>(
  State(state): State<AppState<S>>,
  Path((id, page)): Path<(Uuid, usize)>,
  Json(body): Json<EvaluationBody>,
) -> Result<Json<SurveySession>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let selection = match (body.none, body.selected) {
    (true, None) => Selection::NoneSelected,
    (false, Some(numbers)) => Selection::Selected(numbers),
    _ => {
      return Err(ApiError::BadRequest(
        "provide either \"none\": true or \"selected\": [..]".to_owned(),
      ));
    }
  };

  let mut session = load_session(&state, id).await?;
  session.commit_evaluation(page, selection)?;
  save_session(&state, &session).await?;
  Ok(Json(session))
}

/// `POST /sessions/:id/back`
pub async fn back<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SurveySession>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let mut session = load_session(&state, id).await?;
  session.back()?;
  save_session(&state, &session).await?;
  Ok(Json(session))
}

// ─── Completion ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
  pub response_id: Uuid,
  /// Post-completion redirect for this survey type, when configured.
  pub redirect:    Option<String>,
}

/// `POST /sessions/:id/complete` — assembles the submission record, writes
/// it through the sink, and deletes the session only after the write
/// succeeded. Retry-safe: the sink upserts by response id.
pub async fn complete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CompleteResponse>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let session = load_session(&state, id).await?;
  if session.stage != Stage::Completion {
    return Err(ApiError::Validation(ideate_core::Error::WrongStage(
      session.stage,
    )));
  }

  let now = Utc::now();
  if now < session.start_date {
    tracing::warn!(
      response_id = %session.response_id,
      start = %session.start_date,
      end = %now,
      "end time precedes start time; duration clamped to zero"
    );
  }
  let record = assemble(&session, now)?;

  SubmissionSink::submit(&*state.store, &record)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  SessionStore::delete(&*state.store, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(
    response_id = %record.response_id,
    survey_type = %record.survey_type,
    duration_secs = record.duration_secs,
    "submission recorded"
  );

  let redirect = state
    .config
    .redirects
    .get(&session.survey_type)
    .cloned();
  Ok(Json(CompleteResponse { response_id: record.response_id, redirect }))
}
