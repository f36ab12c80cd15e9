//! Error types for `ideate-core`.

use thiserror::Error;

use crate::session::Stage;

#[derive(Debug, Error)]
pub enum Error {
  /// The backing idea table is missing or malformed. Fatal: no partial
  /// corpus is ever served.
  #[error("idea table unavailable: {0}")]
  DataUnavailable(String),

  #[error("no applications were selected")]
  NoApplicationsSelected,

  #[error("participant id must be at least {min} characters")]
  ParticipantIdTooShort { min: usize },

  #[error("no application has been chosen for evaluation")]
  NoEvaluatedApplication,

  #[error("select at least one idea or \"none of the above\"")]
  EmptySelection,

  #[error("idea number {0} is outside 1..=10")]
  IdeaNumberOutOfRange(u8),

  #[error("evaluation page {requested} is not the current page {current}")]
  PageMismatch { current: usize, requested: usize },

  #[error("evaluation page {0} has no sampled source")]
  PageOutOfRange(usize),

  #[error("operation not allowed in stage {0}")]
  WrongStage(Stage),

  #[error("cannot navigate back from stage {0}")]
  BackNotAllowed(Stage),

  #[error("malformed selection encoding: {0:?}")]
  MalformedSelection(Vec<i32>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// `true` for recoverable stage-precondition failures: the attempted
  /// transition is rejected, the session is unchanged, and the participant
  /// is re-shown the current stage with the message.
  pub fn is_validation(&self) -> bool {
    !matches!(self, Self::DataUnavailable(_) | Self::Serialization(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
