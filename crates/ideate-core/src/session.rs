//! Survey session state — the durable record of one participant's progress.
//!
//! A session is an explicit value passed to and returned from every stage
//! transition; there is no ambient mutable survey state. The persistence
//! boundary snapshots the whole value after each successful transition, so a
//! reload resumes at the last committed stage.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  source::{Source, SurveyType, UsageFrequency},
};

// ─── Stage ───────────────────────────────────────────────────────────────────

/// One step of the fixed survey sequence. Evaluation pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
  Home,
  AppSelection,
  FrequencyCapture,
  Evaluation { page: usize },
  Completion,
}

impl std::fmt::Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Home => f.write_str("home"),
      Self::AppSelection => f.write_str("app_selection"),
      Self::FrequencyCapture => f.write_str("frequency_capture"),
      Self::Evaluation { page } => write!(f, "evaluation[{page}]"),
      Self::Completion => f.write_str("completion"),
    }
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// The recorded outcome of one evaluation page, kept as an explicit
/// three-way union. The legacy array shapes (`[-1]` not presented, `[0]`
/// none selected, `[n, ...]` selected original idea numbers) exist only at
/// the persistence boundary via [`Selection::to_wire`] /
/// [`Selection::from_wire`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ideas", rename_all = "snake_case")]
pub enum Selection {
  /// The source was never shown to this participant.
  NotPresented,
  /// The page was shown and the participant marked "none of the above".
  NoneSelected,
  /// Ascending, distinct original idea numbers in `1..=10`. Never empty.
  Selected(Vec<u8>),
}

impl Selection {
  /// Build a committed selection from raw idea numbers: deduplicated,
  /// sorted ascending for determinism, rejected when empty or out of range.
  pub fn selected(numbers: impl IntoIterator<Item = u8>) -> Result<Self> {
    let mut numbers: Vec<u8> = numbers.into_iter().collect();
    numbers.sort_unstable();
    numbers.dedup();
    if numbers.is_empty() {
      return Err(Error::EmptySelection);
    }
    for &n in &numbers {
      if !(1..=10).contains(&n) {
        return Err(Error::IdeaNumberOutOfRange(n));
      }
    }
    Ok(Self::Selected(numbers))
  }

  /// `true` once the page has a recorded answer (anything but
  /// [`Selection::NotPresented`]).
  pub fn is_committed(&self) -> bool { !matches!(self, Self::NotPresented) }

  /// The legacy wire shape written to the response tables.
  pub fn to_wire(&self) -> Vec<i32> {
    match self {
      Self::NotPresented => vec![-1],
      Self::NoneSelected => vec![0],
      Self::Selected(numbers) => {
        numbers.iter().map(|&n| i32::from(n)).collect()
      }
    }
  }

  /// Parse the legacy wire shape back into the explicit union.
  pub fn from_wire(values: &[i32]) -> Result<Self> {
    match values {
      [-1] => Ok(Self::NotPresented),
      [0] => Ok(Self::NoneSelected),
      [] => Err(Error::MalformedSelection(values.to_vec())),
      numbers => {
        let converted: Result<Vec<u8>> = numbers
          .iter()
          .map(|&n| {
            u8::try_from(n)
              .ok()
              .filter(|n| (1..=10).contains(n))
              .ok_or_else(|| Error::MalformedSelection(values.to_vec()))
          })
          .collect();
        Self::selected(converted?)
      }
    }
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// The mutable per-participant aggregate. Created at survey start, mutated
/// only by the stage-transition methods in [`crate::machine`], destroyed
/// after a successful terminal submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySession {
  /// Opaque unique token, assigned at session start and never reassigned.
  pub response_id:        Uuid,
  pub survey_type:        SurveyType,
  pub start_date:         DateTime<Utc>,
  pub selected_app_ids:   Vec<String>,
  /// Chosen uniformly from `selected_app_ids`, exactly once, and memoized.
  pub evaluated_app_id:   Option<String>,
  pub prolific_id:        Option<String>,
  pub usage_frequency:    Option<UsageFrequency>,
  /// Fixed page order once non-empty; contains validation exactly once.
  pub source_order:       Vec<Source>,
  /// Available sources the sampler did not draw. Never contains validation.
  pub unselected_sources: BTreeSet<Source>,
  /// Every enumerated source is always present, defaulting to
  /// [`Selection::NotPresented`].
  pub evaluations:        BTreeMap<Source, Selection>,
  pub stage:              Stage,
}

impl SurveySession {
  /// Start a session: the `Home → AppSelection` transition. Always allowed;
  /// yields a fresh response id, empty selections, and all-`NotPresented`
  /// evaluation defaults.
  pub fn new(survey_type: SurveyType, now: DateTime<Utc>) -> Self {
    Self {
      response_id:        Uuid::new_v4(),
      survey_type,
      start_date:         now,
      selected_app_ids:   Vec::new(),
      evaluated_app_id:   None,
      prolific_id:        None,
      usage_frequency:    None,
      source_order:       Vec::new(),
      unselected_sources: BTreeSet::new(),
      evaluations:        Source::iter()
        .map(|s| (s, Selection::NotPresented))
        .collect(),
      stage:              Stage::AppSelection,
    }
  }

  /// Number of evaluation pages; zero until the sampler has run.
  pub fn page_count(&self) -> usize { self.source_order.len() }

  /// The source backing the current evaluation page, if the session is on
  /// one.
  pub fn current_source(&self) -> Option<Source> {
    match self.stage {
      Stage::Evaluation { page } => self.source_order.get(page - 1).copied(),
      _ => None,
    }
  }

  /// The recorded selection for `source`. Used to re-populate a page on
  /// back-navigation.
  pub fn selection_for(&self, source: Source) -> &Selection {
    self.evaluations.get(&source).unwrap_or(&Selection::NotPresented)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_session_defaults_every_source_to_not_presented() {
    let session = SurveySession::new(SurveyType::Intent, Utc::now());
    assert_eq!(session.stage, Stage::AppSelection);
    assert_eq!(session.evaluations.len(), Source::iter().count());
    assert!(
      session
        .evaluations
        .values()
        .all(|s| *s == Selection::NotPresented)
    );
  }

  #[test]
  fn selected_sorts_and_deduplicates() {
    let selection = Selection::selected([7, 2, 7, 1]).unwrap();
    assert_eq!(selection, Selection::Selected(vec![1, 2, 7]));
  }

  #[test]
  fn selected_rejects_empty_and_out_of_range() {
    assert!(matches!(
      Selection::selected([]),
      Err(Error::EmptySelection)
    ));
    assert!(matches!(
      Selection::selected([11]),
      Err(Error::IdeaNumberOutOfRange(11))
    ));
    assert!(matches!(
      Selection::selected([0, 3]),
      Err(Error::IdeaNumberOutOfRange(0))
    ));
  }

  #[test]
  fn wire_round_trip() {
    for selection in [
      Selection::NotPresented,
      Selection::NoneSelected,
      Selection::Selected(vec![1, 4, 9]),
    ] {
      let parsed = Selection::from_wire(&selection.to_wire()).unwrap();
      assert_eq!(parsed, selection);
    }
  }

  #[test]
  fn from_wire_rejects_mixed_sentinels() {
    assert!(Selection::from_wire(&[0, 3]).is_err());
    assert!(Selection::from_wire(&[-1, 2]).is_err());
    assert!(Selection::from_wire(&[]).is_err());
  }

  #[test]
  fn session_snapshot_round_trips_through_json() {
    let mut session = SurveySession::new(SurveyType::Usefulness, Utc::now());
    session.selected_app_ids = vec!["X".into(), "Y".into()];
    session.evaluated_app_id = Some("X".into());
    session.source_order = vec![Source::Cot, Source::Validation];
    session
      .evaluations
      .insert(Source::Cot, Selection::Selected(vec![2, 5]));
    session.stage = Stage::Evaluation { page: 2 };

    let json = serde_json::to_string(&session).unwrap();
    let restored: SurveySession = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, session);
  }
}
