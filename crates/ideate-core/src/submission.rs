//! The Submission Assembler — flattens a finished session into the record
//! shape the persistence boundary expects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{
  Result,
  session::SurveySession,
  source::{Source, SurveyType},
};

/// The flat, write-once shape handed to the submission sink. Every
/// enumerated source has an entry in `selections`; there are no missing
/// keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
  pub response_id:      Uuid,
  pub survey_type:      SurveyType,
  pub start_date:       DateTime<Utc>,
  pub end_date:         DateTime<Utc>,
  /// Always 100: only finished sessions are assembled.
  pub progress:         i64,
  /// Whole seconds from start to assembly, clamped to be non-negative.
  pub duration_secs:    i64,
  /// Always 1.
  pub finished:         i64,
  /// JSON array of every originally selected application id, independent
  /// of which one was evaluated.
  pub app_id_selected:  String,
  pub app_id_evaluated: String,
  pub prolific_id:      String,
  /// Usage-frequency code for the evaluated app; 0 when never captured.
  pub familiarity:      i64,
  /// JSON-encoded legacy selection array per source: `[-1]` not presented,
  /// `[0]` none selected, otherwise ascending original idea numbers.
  pub selections:       BTreeMap<Source, String>,
}

/// Flatten `session` as of `now`. Pure; called once at the terminal stage,
/// and re-sent unchanged on retry.
///
/// A `now` earlier than the session start (clock skew) clamps the duration
/// to zero rather than failing; callers surface it as a data-quality
/// warning.
pub fn assemble(
  session: &SurveySession,
  now: DateTime<Utc>,
) -> Result<SubmissionRecord> {
  let duration_secs = (now - session.start_date).num_seconds().max(0);

  let familiarity = session
    .usage_frequency
    .map(|f| f.familiarity_code())
    .unwrap_or(0);

  let mut selections = BTreeMap::new();
  for source in Source::iter() {
    let wire = session.selection_for(source).to_wire();
    selections.insert(source, serde_json::to_string(&wire)?);
  }

  Ok(SubmissionRecord {
    response_id: session.response_id,
    survey_type: session.survey_type,
    start_date: session.start_date,
    end_date: now,
    progress: 100,
    duration_secs,
    finished: 1,
    app_id_selected: serde_json::to_string(&session.selected_app_ids)?,
    app_id_evaluated: session
      .evaluated_app_id
      .clone()
      .unwrap_or_default(),
    prolific_id: session.prolific_id.clone().unwrap_or_default(),
    familiarity,
    selections,
  })
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::{
    session::{Selection, Stage},
    source::UsageFrequency,
  };

  fn finished_session() -> SurveySession {
    let mut session = SurveySession::new(SurveyType::Intent, Utc::now());
    session.selected_app_ids = vec!["X".into(), "Y".into()];
    session.evaluated_app_id = Some("X".into());
    session.prolific_id = Some("PROLIFIC123".into());
    session.usage_frequency = Some(UsageFrequency::Weekly);
    session.source_order =
      vec![Source::Dbgnn, Source::Validation, Source::Cot];
    session
      .evaluations
      .insert(Source::Dbgnn, Selection::Selected(vec![2, 7]));
    session
      .evaluations
      .insert(Source::Validation, Selection::NoneSelected);
    session
      .evaluations
      .insert(Source::Cot, Selection::Selected(vec![1]));
    session.stage = Stage::Completion;
    session
  }

  #[test]
  fn every_source_has_a_wire_value() {
    let session = finished_session();
    let record = assemble(&session, Utc::now()).unwrap();

    assert_eq!(record.selections.len(), Source::iter().count());
    assert_eq!(record.selections[&Source::Dbgnn], "[2,7]");
    assert_eq!(record.selections[&Source::Validation], "[0]");
    assert_eq!(record.selections[&Source::Ufgc], "[-1]");
    assert_eq!(record.selections[&Source::Zero], "[-1]");
  }

  #[test]
  fn identity_and_familiarity_fields() {
    let session = finished_session();
    let record = assemble(&session, Utc::now()).unwrap();

    assert_eq!(record.app_id_selected, r#"["X","Y"]"#);
    assert_eq!(record.app_id_evaluated, "X");
    assert_eq!(record.prolific_id, "PROLIFIC123");
    assert_eq!(record.familiarity, 3);
    assert_eq!(record.progress, 100);
    assert_eq!(record.finished, 1);
  }

  #[test]
  fn missing_frequency_maps_to_zero() {
    let mut session = finished_session();
    session.usage_frequency = None;
    let record = assemble(&session, Utc::now()).unwrap();
    assert_eq!(record.familiarity, 0);
  }

  #[test]
  fn duration_is_whole_seconds_and_never_negative() {
    let session = finished_session();
    let later = session.start_date + Duration::seconds(90);
    assert_eq!(assemble(&session, later).unwrap().duration_secs, 90);

    let earlier = session.start_date - Duration::seconds(5);
    assert_eq!(assemble(&session, earlier).unwrap().duration_secs, 0);
  }
}
