//! The Idea Corpus — an in-memory, read-only index over the flat idea table.
//!
//! Built once from loaded [`IdeaRecord`] rows and immutable thereafter; safe
//! for unlimited concurrent readers. Answers the three query shapes the
//! survey needs: distinct applications, available sources per application,
//! and the idea set for an `(application, source)` pair.

use std::collections::{BTreeSet, HashMap};

use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use crate::source::Source;

/// Sentinel application id carried by validation rows (and ignored on
/// validation lookups).
pub const VALIDATION_APP_ID: &str = "NA";

/// Number of idea slots per corpus row.
pub const IDEA_SLOTS: usize = 10;

// ─── Records ─────────────────────────────────────────────────────────────────

/// One row of the idea table: an application, a source, and up to 10 idea
/// texts. Slots may be empty; empty slots are dropped at query time, not
/// surfaced as empty ideas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaRecord {
  pub app_id:   String,
  pub app_name: String,
  pub source:   Source,
  #[serde(default)]
  pub idea_1:   String,
  #[serde(default)]
  pub idea_2:   String,
  #[serde(default)]
  pub idea_3:   String,
  #[serde(default)]
  pub idea_4:   String,
  #[serde(default)]
  pub idea_5:   String,
  #[serde(default)]
  pub idea_6:   String,
  #[serde(default)]
  pub idea_7:   String,
  #[serde(default)]
  pub idea_8:   String,
  #[serde(default)]
  pub idea_9:   String,
  #[serde(default)]
  pub idea_10:  String,
}

impl IdeaRecord {
  fn slots(&self) -> [&str; IDEA_SLOTS] {
    [
      &self.idea_1, &self.idea_2, &self.idea_3, &self.idea_4, &self.idea_5,
      &self.idea_6, &self.idea_7, &self.idea_8, &self.idea_9, &self.idea_10,
    ]
  }

  /// Non-empty slots, trimmed, each tagged with its 1-based original slot
  /// number. The original number is the idea's permanent identity across
  /// randomized display, so it survives any later shuffle.
  fn ideas(&self) -> Vec<Idea> {
    self
      .slots()
      .iter()
      .enumerate()
      .filter_map(|(i, text)| {
        let text = text.trim();
        if text.is_empty() {
          None
        } else {
          Some(Idea {
            text:            text.to_owned(),
            original_number: (i + 1) as u8,
          })
        }
      })
      .collect()
  }

  fn has_ideas(&self) -> bool {
    self.slots().iter().any(|s| !s.trim().is_empty())
  }
}

/// A distinct `(app_id, app_name)` pair derived from the corpus.
/// First-seen name wins when the table carries duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
  pub app_id:   String,
  pub app_name: String,
}

/// One proposed feature, tied to its original slot number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
  pub text:            String,
  pub original_number: u8,
}

/// The result of an idea lookup. An empty `ideas` list is a legitimate
/// result, not an error; callers branch on it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdeaSet {
  pub ideas:            Vec<Idea>,
  pub application_name: String,
}

// ─── Corpus ──────────────────────────────────────────────────────────────────

/// The lazily-consulted, eagerly-built corpus index.
#[derive(Debug, Clone)]
pub struct IdeaCorpus {
  records:      Vec<IdeaRecord>,
  /// `(app_id, source)` to record position. First row wins: for a given
  /// pair there is at most one authoritative record.
  index:        HashMap<(String, Source), usize>,
  /// Deduplicated by `app_id`, in order of first appearance.
  applications: Vec<Application>,
}

impl IdeaCorpus {
  pub fn from_records(records: Vec<IdeaRecord>) -> Self {
    let mut index = HashMap::new();
    let mut applications: Vec<Application> = Vec::new();

    for (position, record) in records.iter().enumerate() {
      index
        .entry((record.app_id.clone(), record.source))
        .or_insert(position);
      if !applications.iter().any(|a| a.app_id == record.app_id) {
        applications.push(Application {
          app_id:   record.app_id.clone(),
          app_name: record.app_name.clone(),
        });
      }
    }

    Self { records, index, applications }
  }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  /// All distinct applications, in insertion order of first appearance.
  pub fn applications(&self) -> &[Application] { &self.applications }

  /// A uniform random offer of up to `count` applications, excluding the
  /// validation sentinel. Used by the app-selection stage, and re-invoked
  /// with a fresh draw when the participant reports none familiar.
  pub fn random_applications<R: Rng>(
    &self,
    count: usize,
    rng: &mut R,
  ) -> Vec<Application> {
    let mut offer: Vec<Application> = self
      .applications
      .iter()
      .filter(|a| a.app_id != VALIDATION_APP_ID)
      .cloned()
      .collect();
    offer.shuffle(rng);
    offer.truncate(count.min(offer.len()));
    offer
  }

  pub fn application_name(&self, app_id: &str) -> Option<&str> {
    self
      .applications
      .iter()
      .find(|a| a.app_id == app_id)
      .map(|a| a.app_name.as_str())
  }

  /// All sources with an authoritative record for `app_id` that carries at
  /// least one non-empty idea slot. Never includes [`Source::Validation`],
  /// which is application-independent.
  pub fn sources_for(&self, app_id: &str) -> BTreeSet<Source> {
    self
      .index
      .iter()
      .filter(|((id, source), position)| {
        id == app_id
          && !source.is_validation()
          && self.records[**position].has_ideas()
      })
      .map(|((_, source), _)| *source)
      .collect()
  }

  /// The idea set for `(app_id, source)`. Validation lookups ignore the
  /// requested app and resolve against the `(NA, VALIDATION)` row. A missing
  /// record yields an empty idea list.
  pub fn ideas_for(&self, app_id: &str, source: Source) -> IdeaSet {
    let key_app = if source.is_validation() {
      VALIDATION_APP_ID
    } else {
      app_id
    };

    match self.index.get(&(key_app.to_owned(), source)) {
      Some(&position) => {
        let record = &self.records[position];
        IdeaSet {
          ideas:            record.ideas(),
          application_name: record.app_name.clone(),
        }
      }
      None => IdeaSet {
        ideas:            Vec::new(),
        application_name: self
          .application_name(app_id)
          .unwrap_or(app_id)
          .to_owned(),
      },
    }
  }
}
