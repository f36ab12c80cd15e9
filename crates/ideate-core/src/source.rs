//! The enumerated survey vocabulary: idea sources, survey types, and usage
//! frequencies.
//!
//! `Source` is the single place the production source set is defined.
//! Everything else — sampling bounds, submission columns, default
//! evaluation maps — iterates the enum, so adding a source is a one-line
//! change here plus a schema column.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

// ─── Source ──────────────────────────────────────────────────────────────────

/// A labeled idea-generation method whose proposed ideas are shown to
/// participants. `Validation` is the distinguished, application-independent
/// control source; its corpus rows carry the sentinel application id `NA`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
  Dbgnn,
  Ufgc,
  Cot,
  Zero,
  Validation,
}

impl Source {
  pub fn is_validation(self) -> bool { matches!(self, Self::Validation) }

  /// The label used on the wire and in the corpus `source` column.
  /// Must match the `rename_all = "UPPERCASE"` serde tags above.
  pub fn wire_name(self) -> &'static str {
    match self {
      Self::Dbgnn => "DBGNN",
      Self::Ufgc => "UFGC",
      Self::Cot => "COT",
      Self::Zero => "ZERO",
      Self::Validation => "VALIDATION",
    }
  }

  /// The response-table column holding this source's selection array.
  pub fn column(self) -> &'static str {
    match self {
      Self::Dbgnn => "dbgnn",
      Self::Ufgc => "ufgc",
      Self::Cot => "cot",
      Self::Zero => "zero",
      Self::Validation => "validation",
    }
  }

  /// All evaluation sources, i.e. everything except [`Source::Validation`],
  /// in declaration order.
  pub fn evaluation_sources() -> impl Iterator<Item = Source> {
    use strum::IntoEnumIterator as _;
    Self::iter().filter(|s| !s.is_validation())
  }
}

impl std::fmt::Display for Source {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.wire_name())
  }
}

// ─── Survey type ─────────────────────────────────────────────────────────────

/// Which study a session belongs to. Selects the response table the finished
/// submission is written to and the post-completion redirect.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize,
  Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum SurveyType {
  #[default]
  Intent,
  Usefulness,
  Originality,
  IntentStudent,
  UsefulnessStudent,
  OriginalityStudent,
}

impl SurveyType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Intent => "intent",
      Self::Usefulness => "usefulness",
      Self::Originality => "originality",
      Self::IntentStudent => "intent_student",
      Self::UsefulnessStudent => "usefulness_student",
      Self::OriginalityStudent => "originality_student",
    }
  }

  /// The response table submissions for this survey type are upserted into.
  pub fn table(self) -> &'static str {
    match self {
      Self::Intent => "survey_intent",
      Self::Usefulness => "survey_usefulness",
      Self::Originality => "survey_originality",
      Self::IntentStudent => "survey_intent_student",
      Self::UsefulnessStudent => "survey_usefulness_student",
      Self::OriginalityStudent => "survey_originality_student",
    }
  }
}

impl std::fmt::Display for SurveyType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Usage frequency ─────────────────────────────────────────────────────────

/// How often the participant uses the evaluated app. Captured once, before
/// the evaluation pages.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum UsageFrequency {
  Daily,
  Weekly,
  Monthly,
  Yearly,
}

impl UsageFrequency {
  /// The integer familiarity code stored in the submission record.
  /// An absent frequency maps to 0 at assembly time.
  pub fn familiarity_code(self) -> i64 {
    match self {
      Self::Daily => 4,
      Self::Weekly => 3,
      Self::Monthly => 2,
      Self::Yearly => 1,
    }
  }
}
