//! Persistence boundaries: session snapshots and finished submissions.
//!
//! Both traits are implemented by storage backends (e.g.
//! `ideate-store-sqlite`). Higher layers depend on these abstractions, not
//! on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{session::SurveySession, submission::SubmissionRecord};

/// Durable per-participant session state, keyed by response id.
///
/// `save` is called after every successful stage transition and must be
/// crash-consistent enough that a `load` resumes at the last committed
/// stage. The model assumes one writer per response id; no locking
/// discipline is provided.
pub trait SessionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a session snapshot. Returns `None` if not found.
  fn load(
    &self,
    response_id: Uuid,
  ) -> impl Future<Output = Result<Option<SurveySession>, Self::Error>> + Send + '_;

  /// Write (or overwrite) the snapshot for `session.response_id`.
  fn save<'a>(
    &'a self,
    session: &'a SurveySession,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove a session, e.g. after its terminal submission succeeded.
  /// Removing an absent session is not an error.
  fn delete(
    &self,
    response_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// The remote submission boundary for finished responses.
///
/// Upsert semantics keyed by response id: submitting the same record twice
/// must converge on one row. Retries are driven by the caller.
pub trait SubmissionSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn submit<'a>(
    &'a self,
    record: &'a SubmissionRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
