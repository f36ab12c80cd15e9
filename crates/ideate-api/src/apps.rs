//! Handlers for the `/apps` endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/apps` | Every distinct application, corpus order |
//! | `GET`  | `/apps?random=true&count=N` | Uniform random offer, default N = 20 |

use axum::{
  Json,
  extract::{Query, State},
};
use ideate_core::{
  corpus::Application,
  store::{SessionStore, SubmissionSink},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Default size of a random application offer.
pub const DEFAULT_OFFER_SIZE: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If `true`, return a fresh uniform random offer instead of the full
  /// list. Re-requesting yields a new draw.
  #[serde(default)]
  pub random: bool,
  /// Offer size; ignored unless `random=true`.
  pub count:  Option<usize>,
}

/// `GET /apps[?random=true][&count=N]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Application>>, ApiError>
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  if params.random {
    let count = params.count.unwrap_or(DEFAULT_OFFER_SIZE);
    let offer = state
      .corpus
      .random_applications(count, &mut rand::thread_rng());
    return Ok(Json(offer));
  }
  Ok(Json(state.corpus.applications().to_vec()))
}
