//! The Source Sampler — decides which idea sources a session sees, and in
//! what order.
//!
//! All randomness in the survey flows through injectable [`Rng`] parameters,
//! so tests drive the sampler with a seeded generator. The resulting plan is
//! written into the session exactly once; re-deriving it mid-session would
//! desynchronize already-recorded answers from their page position.

use std::collections::BTreeSet;

use rand::{Rng, seq::SliceRandom as _};

use crate::source::Source;

/// Maximum number of evaluation sources drawn per session, excluding the
/// always-included validation source.
pub const SAMPLE_SIZE: usize = 3;

/// A fixed presentation plan for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
  /// Page order: the sampled sources plus [`Source::Validation`] exactly
  /// once, shuffled so validation is not always last.
  pub order:      Vec<Source>,
  /// Available sources that were not drawn. Never contains validation.
  pub unselected: BTreeSet<Source>,
  /// Set when no sources were available and the fixed default subset was
  /// used instead. The caller logs this for operator visibility.
  pub degraded:   bool,
}

/// Draw `min(SAMPLE_SIZE, |available|)` sources uniformly without
/// replacement, append validation, and shuffle the combined order.
///
/// `available` is the per-application source set and never contains
/// validation; validation enters the order exactly once, here.
pub fn sample_sources<R: Rng>(
  available: &BTreeSet<Source>,
  rng: &mut R,
) -> SourcePlan {
  if available.is_empty() {
    // Degraded mode: no sources for this application. A fixed default
    // subset keeps the session able to proceed.
    let mut order: Vec<Source> =
      Source::evaluation_sources().take(SAMPLE_SIZE).collect();
    order.push(Source::Validation);
    order.shuffle(rng);
    return SourcePlan { order, unselected: BTreeSet::new(), degraded: true };
  }

  let mut pool: Vec<Source> = available
    .iter()
    .copied()
    .filter(|s| !s.is_validation())
    .collect();
  pool.shuffle(rng);
  pool.truncate(SAMPLE_SIZE.min(pool.len()));

  let chosen: BTreeSet<Source> = pool.iter().copied().collect();
  let unselected = available.difference(&chosen).copied().collect();

  let mut order = pool;
  order.push(Source::Validation);
  order.shuffle(rng);

  SourcePlan { order, unselected, degraded: false }
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng as _, rngs::StdRng};

  use super::*;

  fn rng(seed: u64) -> StdRng { StdRng::seed_from_u64(seed) }

  #[test]
  fn order_contains_validation_exactly_once() {
    let available: BTreeSet<_> = Source::evaluation_sources().collect();
    for seed in 0..64 {
      let plan = sample_sources(&available, &mut rng(seed));
      let validations =
        plan.order.iter().filter(|s| s.is_validation()).count();
      assert_eq!(validations, 1);
      assert_eq!(plan.order.len(), SAMPLE_SIZE + 1);
    }
  }

  #[test]
  fn small_pools_are_taken_whole() {
    let available = BTreeSet::from([Source::Dbgnn, Source::Cot]);
    let plan = sample_sources(&available, &mut rng(3));
    assert_eq!(plan.order.len(), 3);
    assert!(plan.unselected.is_empty());
    assert!(!plan.degraded);
  }

  #[test]
  fn unselected_is_the_complement_of_the_draw() {
    let available: BTreeSet<_> = Source::evaluation_sources().collect();
    let plan = sample_sources(&available, &mut rng(11));

    assert_eq!(plan.unselected.len(), available.len() - SAMPLE_SIZE);
    for source in &plan.unselected {
      assert!(!plan.order.contains(source));
      assert!(!source.is_validation());
    }
    for source in &plan.order {
      assert!(source.is_validation() || available.contains(source));
    }
  }

  #[test]
  fn empty_availability_falls_back_to_defaults() {
    let plan = sample_sources(&BTreeSet::new(), &mut rng(0));
    assert!(plan.degraded);
    assert_eq!(plan.order.len(), SAMPLE_SIZE + 1);
    assert_eq!(
      plan.order.iter().filter(|s| s.is_validation()).count(),
      1
    );
    assert!(plan.unselected.is_empty());
  }

  #[test]
  fn validation_position_varies_across_draws() {
    // Statistical, not exact: over many seeds validation must land
    // somewhere other than the final slot at least once.
    let available: BTreeSet<_> = Source::evaluation_sources().collect();
    let non_terminal = (0..128).any(|seed| {
      let plan = sample_sources(&available, &mut rng(seed));
      !plan.order.last().is_some_and(|s| s.is_validation())
    });
    assert!(non_terminal);
  }

  #[test]
  fn draw_is_roughly_uniform_over_sources() {
    let available: BTreeSet<_> = Source::evaluation_sources().collect();
    let mut counts = std::collections::BTreeMap::new();
    let trials = 400;
    for seed in 0..trials {
      let plan = sample_sources(&available, &mut rng(seed));
      for source in plan.order.iter().filter(|s| !s.is_validation()) {
        *counts.entry(*source).or_insert(0u32) += 1;
      }
    }
    // Each of 4 sources is drawn in 3 of 4 orderings on average.
    for (_, count) in counts {
      assert!(count > trials as u32 / 2, "count {count} of {trials}");
    }
  }
}
