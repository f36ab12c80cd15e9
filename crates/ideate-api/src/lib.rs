//! JSON REST API for Ideate.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`SessionStore`] and [`SubmissionSink`], plus the immutable
//! [`IdeaCorpus`] loaded at startup. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! axum::serve(listener, ideate_api::router(state)).await?;
//! ```

pub mod apps;
pub mod error;
pub mod ideas;
pub mod logs;
pub mod sessions;

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use ideate_core::{
  corpus::IdeaCorpus,
  source::SurveyType,
  store::{SessionStore, SubmissionSink},
};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  /// CSV idea table loaded once at startup.
  pub idea_table_path: PathBuf,
  pub store_path:      PathBuf,
  /// Post-completion redirect per survey type, e.g.
  /// `intent = "https://app.prolific.com/submissions/complete?cc=..."`.
  #[serde(default)]
  pub redirects:       BTreeMap<SurveyType, String>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers. The corpus is read-only
/// after startup; the store carries all mutable state.
#[derive(Clone)]
pub struct AppState<S> {
  pub corpus: Arc<IdeaCorpus>,
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SessionStore + SubmissionSink + Clone + Send + Sync + 'static,
{
  Router::new()
    // Corpus reads
    .route("/apps", get(apps::list::<S>))
    .route("/sources", get(ideas::sources::<S>))
    .route("/ideas", get(ideas::list::<S>))
    // Session lifecycle
    .route("/sessions", post(sessions::create::<S>))
    .route("/sessions/{id}", get(sessions::get_one::<S>))
    .route("/sessions/{id}/apps", post(sessions::select_apps::<S>))
    .route("/sessions/{id}/frequency", post(sessions::capture_frequency::<S>))
    .route(
      "/sessions/{id}/evaluation/{page}",
      post(sessions::commit_evaluation::<S>),
    )
    .route("/sessions/{id}/back", post(sessions::back::<S>))
    .route("/sessions/{id}/complete", post(sessions::complete::<S>))
    // Client logs
    .route("/logs", post(logs::report))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
