//! Scheduler ranking — pure selection logic shared by store backends.
//!
//! Eligibility filtering (status, locks, skips, preferences) is a storage
//! concern; what remains is ranking the eligible entities by the quality of
//! their candidates. Entities with strong-signal candidates are cheap,
//! high-confidence decisions and are surfaced first; weak ones are
//! deprioritised but never starved, since the scan reaches −5.

/// The aggregate scores of every relation attached to one eligible entity.
/// `None` means the relation has not been scored yet.
#[derive(Debug, Clone)]
pub struct EntityScores {
  pub tms_id: i64,
  pub totals: Vec<Option<i32>>,
}

impl EntityScores {
  /// Mean aggregate over *all* relations, with unscored ones contributing
  /// zero to the sum but still counting in the denominator (source
  /// behaviour).
  fn mean(&self) -> f64 {
    let sum: i64 = self.totals.iter().flatten().map(|t| *t as i64).sum();
    sum as f64 / self.totals.len() as f64
  }
}

/// Pick the next entity to review from the eligible set.
///
/// For each aggregate level from +5 down to −5, collect the entities having
/// at least one relation at that level; within the first non-empty level,
/// pick the entity with the highest mean aggregate, breaking ties on the
/// lowest `tms_id`. Entities whose relations are all unscored or hold the
/// error sentinel never hit a scanned level and are unreachable here.
pub fn pick_entity(groups: &[EntityScores]) -> Option<i64> {
  for level in (-5..=5).rev() {
    let mut best: Option<(&EntityScores, f64)> = None;

    for group in groups {
      if group.totals.is_empty() {
        continue;
      }
      if !group.totals.iter().flatten().any(|t| *t == level) {
        continue;
      }

      let mean = group.mean();
      let better = match best {
        None => true,
        Some((current, current_mean)) => {
          mean > current_mean
            || (mean == current_mean && group.tms_id < current.tms_id)
        }
      };
      if better {
        best = Some((group, mean));
      }
    }

    if let Some((winner, _)) = best {
      return Some(winner.tms_id);
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::relation::SCORE_ERROR_SENTINEL;

  fn group(tms_id: i64, totals: &[i32]) -> EntityScores {
    EntityScores {
      tms_id,
      totals: totals.iter().map(|t| Some(*t)).collect(),
    }
  }

  #[test]
  fn highest_level_wins_before_mean() {
    let groups = [group(1, &[3, 3, 3]), group(2, &[4])];
    assert_eq!(pick_entity(&groups), Some(2));
  }

  #[test]
  fn mean_breaks_level_ties() {
    // E has relations at +5 and +3 (mean 4); F has a single +5 (mean 5).
    // Both sit at level +5; F's higher mean wins.
    let e = group(10, &[5, 3]);
    let f = group(20, &[5]);
    assert_eq!(pick_entity(&[e, f]), Some(20));
  }

  #[test]
  fn equal_means_break_on_lowest_id() {
    let groups = [group(7, &[5]), group(3, &[5])];
    assert_eq!(pick_entity(&groups), Some(3));
  }

  #[test]
  fn negative_levels_are_reached() {
    let groups = [group(1, &[-5]), group(2, &[-4])];
    assert_eq!(pick_entity(&groups), Some(2));
  }

  #[test]
  fn unscored_and_sentinel_relations_never_match_a_level() {
    let unscored = EntityScores { tms_id: 1, totals: vec![None, None] };
    let errored = group(2, &[SCORE_ERROR_SENTINEL]);
    assert_eq!(pick_entity(&[unscored, errored]), None);
  }

  #[test]
  fn unscored_relations_still_dilute_the_mean() {
    // Both entities have a +5 relation; the second also carries an unscored
    // one, halving its mean.
    let solo = group(1, &[5]);
    let diluted = EntityScores { tms_id: 2, totals: vec![Some(5), None] };
    assert_eq!(pick_entity(&[diluted, solo]), Some(1));
  }

  #[test]
  fn empty_eligible_set_yields_none() {
    assert_eq!(pick_entity(&[]), None);
  }
}
