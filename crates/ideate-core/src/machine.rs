//! The stage controller — every legal transition of a [`SurveySession`].
//!
//! Each method checks its preconditions before touching the session: a
//! rejected transition returns a validation error and leaves the value
//! unchanged, and there is no silent auto-advance on invalid input. Callers
//! persist the session after every successful call.

use rand::{Rng, seq::SliceRandom as _};

use crate::{
  Error, Result,
  corpus::IdeaCorpus,
  sampler::sample_sources,
  session::{Selection, Stage, SurveySession},
  source::{Source, UsageFrequency},
};

/// Minimum length of the trimmed participant identity string.
pub const MIN_PARTICIPANT_ID_LEN: usize = 3;

impl SurveySession {
  /// `AppSelection → FrequencyCapture`. Requires a non-empty application
  /// list; duplicates are dropped, order preserved.
  ///
  /// The evaluated application is drawn uniformly from the selection and
  /// memoized: on re-selection after back-navigation the earlier draw is
  /// kept while it remains in the new set, and redrawn otherwise.
  pub fn select_apps<R: Rng>(
    &mut self,
    app_ids: Vec<String>,
    rng: &mut R,
  ) -> Result<()> {
    if self.stage != Stage::AppSelection {
      return Err(Error::WrongStage(self.stage));
    }

    let mut ids: Vec<String> = Vec::with_capacity(app_ids.len());
    for id in app_ids {
      if !ids.contains(&id) {
        ids.push(id);
      }
    }
    if ids.is_empty() {
      return Err(Error::NoApplicationsSelected);
    }

    let keep_draw = self
      .evaluated_app_id
      .as_ref()
      .is_some_and(|chosen| ids.contains(chosen));
    if !keep_draw {
      self.evaluated_app_id = ids.choose(rng).cloned();
    }

    self.selected_app_ids = ids;
    self.stage = Stage::FrequencyCapture;
    Ok(())
  }

  /// `FrequencyCapture → Evaluation(1)`. Requires a participant id of at
  /// least [`MIN_PARTICIPANT_ID_LEN`] characters after trimming.
  ///
  /// Runs the source sampler iff `source_order` is still unset, so a
  /// participant who navigates back and forward keeps the same page order.
  /// Returns `true` when the sampler fell back to the degraded default
  /// subset; the caller logs that.
  pub fn capture_frequency<R: Rng>(
    &mut self,
    prolific_id: &str,
    frequency: UsageFrequency,
    corpus: &IdeaCorpus,
    rng: &mut R,
  ) -> Result<bool> {
    if self.stage != Stage::FrequencyCapture {
      return Err(Error::WrongStage(self.stage));
    }

    let trimmed = prolific_id.trim();
    if trimmed.chars().count() < MIN_PARTICIPANT_ID_LEN {
      return Err(Error::ParticipantIdTooShort { min: MIN_PARTICIPANT_ID_LEN });
    }

    let evaluated = self
      .evaluated_app_id
      .clone()
      .ok_or(Error::NoEvaluatedApplication)?;

    let mut degraded = false;
    if self.source_order.is_empty() {
      let plan = sample_sources(&corpus.sources_for(&evaluated), rng);
      degraded = plan.degraded;
      self.source_order = plan.order;
      self.unselected_sources = plan.unselected;
    }

    self.prolific_id = Some(trimmed.to_owned());
    self.usage_frequency = Some(frequency);
    self.stage = Stage::Evaluation { page: 1 };
    Ok(degraded)
  }

  /// `Evaluation(i) → Evaluation(i+1)`, or `Evaluation(K) → Completion` on
  /// the final page. `page` must match the current page, and the selection
  /// must be an actual answer: "none of the above" or a non-empty idea set
  /// (the two are mutually exclusive by construction).
  pub fn commit_evaluation(
    &mut self,
    page: usize,
    selection: Selection,
  ) -> Result<()> {
    let current = match self.stage {
      Stage::Evaluation { page } => page,
      other => return Err(Error::WrongStage(other)),
    };
    if page != current {
      return Err(Error::PageMismatch { current, requested: page });
    }

    let committed = match selection {
      Selection::NotPresented => return Err(Error::EmptySelection),
      Selection::NoneSelected => Selection::NoneSelected,
      Selection::Selected(numbers) => Selection::selected(numbers)?,
    };

    let source = self
      .source_order
      .get(page - 1)
      .copied()
      .ok_or(Error::PageOutOfRange(page))?;
    self.evaluations.insert(source, committed);

    if page < self.source_order.len() {
      self.stage = Stage::Evaluation { page: page + 1 };
    } else {
      self.finalize_evaluations();
      self.stage = Stage::Completion;
    }
    Ok(())
  }

  /// Back-navigation: `Evaluation(i) → Evaluation(i-1)`,
  /// `Evaluation(1) → FrequencyCapture`, `FrequencyCapture → AppSelection`.
  /// Never discards previously committed selections.
  pub fn back(&mut self) -> Result<()> {
    self.stage = match self.stage {
      Stage::Evaluation { page } if page > 1 => {
        Stage::Evaluation { page: page - 1 }
      }
      Stage::Evaluation { .. } => Stage::FrequencyCapture,
      Stage::FrequencyCapture => Stage::AppSelection,
      other => return Err(Error::BackNotAllowed(other)),
    };
    Ok(())
  }

  /// Ensure every enumerated source has a recorded value. Sources the
  /// participant never saw stay (or become) [`Selection::NotPresented`].
  /// Idempotent; run on entry to [`Stage::Completion`].
  fn finalize_evaluations(&mut self) {
    use strum::IntoEnumIterator as _;
    for source in Source::iter() {
      self.evaluations.entry(source).or_insert(Selection::NotPresented);
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use rand::{SeedableRng as _, rngs::StdRng};

  use super::*;
  use crate::{
    corpus::IdeaRecord,
    source::SurveyType,
  };

  fn rng(seed: u64) -> StdRng { StdRng::seed_from_u64(seed) }

  fn corpus() -> IdeaCorpus {
    let mut records = Vec::new();
    for source in Source::evaluation_sources() {
      records.push(record("X", "Ex", source));
    }
    records.push(record("NA", "NA", Source::Validation));
    IdeaCorpus::from_records(records)
  }

  fn record(app_id: &str, app_name: &str, source: Source) -> IdeaRecord {
    IdeaRecord {
      app_id:   app_id.to_owned(),
      app_name: app_name.to_owned(),
      source,
      idea_1:   "first idea".to_owned(),
      idea_2:   String::new(),
      idea_3:   "third idea".to_owned(),
      idea_4:   String::new(),
      idea_5:   String::new(),
      idea_6:   String::new(),
      idea_7:   String::new(),
      idea_8:   String::new(),
      idea_9:   String::new(),
      idea_10:  String::new(),
    }
  }

  fn session_at_frequency(seed: u64) -> SurveySession {
    let mut session = SurveySession::new(SurveyType::Intent, Utc::now());
    session
      .select_apps(vec!["X".into(), "Y".into()], &mut rng(seed))
      .unwrap();
    session
  }

  fn session_at_evaluation(seed: u64) -> SurveySession {
    let mut session = session_at_frequency(seed);
    // Force a deterministic evaluated app that the corpus knows.
    session.evaluated_app_id = Some("X".into());
    session
      .capture_frequency(
        "PROLIFIC123",
        UsageFrequency::Daily,
        &corpus(),
        &mut rng(seed),
      )
      .unwrap();
    session
  }

  // ── App selection ─────────────────────────────────────────────────────────

  #[test]
  fn select_apps_requires_nonempty_list() {
    let mut session = SurveySession::new(SurveyType::Intent, Utc::now());
    let before = session.clone();
    let err = session.select_apps(vec![], &mut rng(0)).unwrap_err();
    assert!(matches!(err, Error::NoApplicationsSelected));
    assert_eq!(session, before, "failed transition must not mutate");
  }

  #[test]
  fn select_apps_draws_evaluated_app_from_selection() {
    let mut session = SurveySession::new(SurveyType::Intent, Utc::now());
    session
      .select_apps(vec!["X".into(), "Y".into(), "X".into()], &mut rng(1))
      .unwrap();

    assert_eq!(session.selected_app_ids, vec!["X", "Y"]);
    let evaluated = session.evaluated_app_id.clone().unwrap();
    assert!(session.selected_app_ids.contains(&evaluated));
    assert_eq!(session.stage, Stage::FrequencyCapture);
  }

  #[test]
  fn evaluated_app_draw_is_roughly_uniform() {
    let mut x = 0u32;
    let trials = 300;
    for seed in 0..trials {
      let mut session = SurveySession::new(SurveyType::Intent, Utc::now());
      session
        .select_apps(vec!["X".into(), "Y".into()], &mut rng(seed))
        .unwrap();
      if session.evaluated_app_id.as_deref() == Some("X") {
        x += 1;
      }
    }
    // Two apps: expect about half, allow a generous band.
    assert!((90..=210).contains(&x), "X drawn {x} of {trials}");
  }

  #[test]
  fn reselection_keeps_memoized_draw_when_still_selected() {
    let mut session = SurveySession::new(SurveyType::Intent, Utc::now());
    session
      .select_apps(vec!["X".into(), "Y".into()], &mut rng(2))
      .unwrap();
    let first_draw = session.evaluated_app_id.clone().unwrap();

    session.back().unwrap();
    session
      .select_apps(
        vec!["X".into(), "Y".into(), "Z".into()],
        &mut rng(99),
      )
      .unwrap();
    assert_eq!(session.evaluated_app_id.as_ref(), Some(&first_draw));
  }

  #[test]
  fn reselection_redraws_when_choice_removed() {
    let mut session = SurveySession::new(SurveyType::Intent, Utc::now());
    session.select_apps(vec!["X".into()], &mut rng(2)).unwrap();
    assert_eq!(session.evaluated_app_id.as_deref(), Some("X"));

    session.back().unwrap();
    session.select_apps(vec!["Y".into()], &mut rng(2)).unwrap();
    assert_eq!(session.evaluated_app_id.as_deref(), Some("Y"));
  }

  // ── Frequency capture ─────────────────────────────────────────────────────

  #[test]
  fn capture_frequency_enforces_participant_id_length() {
    let mut session = session_at_frequency(0);
    let before = session.clone();
    let err = session
      .capture_frequency("  ab ", UsageFrequency::Daily, &corpus(), &mut rng(0))
      .unwrap_err();
    assert!(matches!(err, Error::ParticipantIdTooShort { min: 3 }));
    assert_eq!(session, before);
  }

  #[test]
  fn capture_frequency_fixes_source_order_once() {
    let mut session = session_at_evaluation(5);
    let order = session.source_order.clone();
    assert_eq!(order.len(), 4);
    assert_eq!(order.iter().filter(|s| s.is_validation()).count(), 1);

    // Back out and re-enter with a different rng: the order must not move.
    session.back().unwrap();
    session
      .capture_frequency(
        "PROLIFIC123",
        UsageFrequency::Weekly,
        &corpus(),
        &mut rng(12345),
      )
      .unwrap();
    assert_eq!(session.source_order, order);
    assert_eq!(session.usage_frequency, Some(UsageFrequency::Weekly));
  }

  #[test]
  fn capture_frequency_flags_degraded_sampling() {
    let empty = IdeaCorpus::from_records(vec![]);
    let mut session = session_at_frequency(3);
    session.evaluated_app_id = Some("unknown".into());
    let degraded = session
      .capture_frequency("PROLIFIC123", UsageFrequency::Daily, &empty, &mut rng(3))
      .unwrap();
    assert!(degraded);
    assert_eq!(session.source_order.len(), 4);
  }

  // ── Evaluation pages ──────────────────────────────────────────────────────

  #[test]
  fn commit_walks_pages_in_order_and_finishes() {
    let mut session = session_at_evaluation(7);
    let pages = session.page_count();

    for page in 1..=pages {
      assert_eq!(session.stage, Stage::Evaluation { page });
      session
        .commit_evaluation(page, Selection::selected([1, 3]).unwrap())
        .unwrap();
    }
    assert_eq!(session.stage, Stage::Completion);

    for source in &session.source_order {
      assert_eq!(
        session.selection_for(*source),
        &Selection::Selected(vec![1, 3])
      );
    }
  }

  #[test]
  fn commit_rejects_wrong_page_without_mutation() {
    let mut session = session_at_evaluation(8);
    let before = session.clone();
    let err = session
      .commit_evaluation(2, Selection::NoneSelected)
      .unwrap_err();
    assert!(matches!(
      err,
      Error::PageMismatch { current: 1, requested: 2 }
    ));
    assert_eq!(session, before);
  }

  #[test]
  fn commit_rejects_not_presented_as_an_answer() {
    let mut session = session_at_evaluation(9);
    let err = session
      .commit_evaluation(1, Selection::NotPresented)
      .unwrap_err();
    assert!(matches!(err, Error::EmptySelection));
  }

  #[test]
  fn back_and_forward_preserves_committed_selection() {
    let mut session = session_at_evaluation(10);
    let source = session.current_source().unwrap();
    session
      .commit_evaluation(1, Selection::selected([9, 2]).unwrap())
      .unwrap();

    session.back().unwrap();
    assert_eq!(session.stage, Stage::Evaluation { page: 1 });
    assert_eq!(
      session.selection_for(source),
      &Selection::Selected(vec![2, 9])
    );

    // None-selected round-trips the same way.
    session.commit_evaluation(1, Selection::NoneSelected).unwrap();
    session.back().unwrap();
    assert_eq!(session.selection_for(source), &Selection::NoneSelected);
  }

  #[test]
  fn back_from_first_page_returns_to_frequency() {
    let mut session = session_at_evaluation(11);
    session.back().unwrap();
    assert_eq!(session.stage, Stage::FrequencyCapture);
    session.back().unwrap();
    assert_eq!(session.stage, Stage::AppSelection);
    assert!(session.back().is_err());
  }

  // ── Completion ────────────────────────────────────────────────────────────

  #[test]
  fn completion_marks_unseen_sources_not_presented() {
    let mut session = session_at_evaluation(13);
    for page in 1..=session.page_count() {
      session
        .commit_evaluation(page, Selection::NoneSelected)
        .unwrap();
    }

    assert_eq!(session.stage, Stage::Completion);
    for source in &session.unselected_sources {
      assert_eq!(session.selection_for(*source), &Selection::NotPresented);
    }
    use strum::IntoEnumIterator as _;
    assert_eq!(session.evaluations.len(), Source::iter().count());
  }
}
