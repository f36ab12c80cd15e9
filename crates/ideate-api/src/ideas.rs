//! Handlers for the `/sources` and `/ideas` read endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sources?app_id=X` | Sources with at least one idea for the app |
//! | `GET`  | `/ideas?app_id=X&source=S` | Idea set, reshuffled per request |

use axum::{
  Json,
  extract::{Query, State},
};
use ideate_core::{
  corpus::IdeaSet,
  source::Source,
  store::{SessionStore, SubmissionSink},
};
use rand::seq::SliceRandom as _;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SourcesParams {
  pub app_id: String,
}

/// `GET /sources?app_id=X` — never includes the validation source.
pub async fn sources<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<SourcesParams>,
) -> Result<Json<Vec<Source>>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let sources: Vec<Source> =
    state.corpus.sources_for(&params.app_id).into_iter().collect();
  Ok(Json(sources))
}

#[derive(Debug, Deserialize)]
pub struct IdeasParams {
  pub app_id: String,
  pub source: Source,
}

/// `GET /ideas?app_id=X&source=S`
///
/// Display order is randomized on every request; each idea keeps its
/// original slot number, which is what selections refer to. An empty idea
/// list is a legitimate response body, not an error.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<IdeasParams>,
) -> Result<Json<IdeaSet>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  let mut set = state.corpus.ideas_for(&params.app_id, params.source);
  set.ideas.shuffle(&mut rand::thread_rng());
  Ok(Json(set))
}
