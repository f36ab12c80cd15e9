//! Handler for `POST /logs` — client-side event reports.
//!
//! The browser forwards notable events (failed fetches, unexpected states)
//! here so they land in the server's tracing output alongside everything
//! else.

use axum::{Json, http::StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LogReport {
  /// `"warn"` or anything else (treated as info).
  #[serde(default)]
  pub level:   String,
  pub message: String,
  /// Free-form structured context from the client.
  #[serde(default)]
  pub context: serde_json::Value,
}

/// `POST /logs` — always 204; a malformed report is not worth a client
/// error loop.
pub async fn report(Json(body): Json<LogReport>) -> StatusCode {
  if body.level == "warn" {
    tracing::warn!(context = %body.context, "client: {}", body.message);
  } else {
    tracing::info!(context = %body.context, "client: {}", body.message);
  }
  StatusCode::NO_CONTENT
}
