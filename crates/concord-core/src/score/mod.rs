//! Candidate-scoring engine.
//!
//! Three field comparators (dates, places, names) and the aggregator that
//! combines their flags into one [`FieldScores`] per match relation. All of
//! this is pure; the store gathers the inputs and persists the results.

pub mod dates;
pub mod names;
pub mod places;

use serde::{Deserialize, Serialize};

use crate::relation::FieldScores;
use dates::DatedValue;

/// The three-valued outcome of one field comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
  /// The field agrees (+1).
  Match,
  /// Insufficient data — or, for names, close but uncertain (0).
  NoData,
  /// The field disagrees (−1).
  Mismatch,
}

impl Flag {
  pub fn value(&self) -> i32 {
    match self {
      Self::Match => 1,
      Self::NoData => 0,
      Self::Mismatch => -1,
    }
  }
}

/// Everything the aggregator needs to score one (entity, candidate) pair,
/// gathered by the store from event, place and label rows.
#[derive(Debug, Clone, Default)]
pub struct RelationFacts {
  pub candidate_label:        Option<String>,
  pub candidate_birth_dates:  Vec<DatedValue>,
  pub candidate_death_dates:  Vec<DatedValue>,
  pub candidate_birth_places: Vec<String>,
  pub candidate_death_places: Vec<String>,
  pub tms_name:               String,
  pub tms_birth_dates:        Vec<DatedValue>,
  pub tms_death_dates:        Vec<DatedValue>,
  pub tms_birth_places:       Vec<String>,
  pub tms_death_places:       Vec<String>,
}

/// Run the five field comparisons and sum them into the aggregate.
///
/// The aggregate ranges from −5 (every field disagrees) to +5 (every field
/// agrees); ties between relations are resolved by the scheduler, not here.
pub fn score_relation(facts: &RelationFacts) -> FieldScores {
  let birth_date = dates::compare_dates(
    &facts.candidate_birth_dates,
    &facts.tms_birth_dates,
  );
  let death_date = dates::compare_dates(
    &facts.candidate_death_dates,
    &facts.tms_death_dates,
  );
  let birth_place = places::compare_places(
    &facts.candidate_birth_places,
    &facts.tms_birth_places,
  );
  let death_place = places::compare_places(
    &facts.candidate_death_places,
    &facts.tms_death_places,
  );
  let name = names::compare_names(
    facts.candidate_label.as_deref().unwrap_or(""),
    &facts.tms_name,
  );

  let flags = [birth_date, death_date, birth_place, death_place, name];
  let total = flags.iter().map(Flag::value).sum();

  FieldScores {
    birth_date:  birth_date.value(),
    death_date:  death_date.value(),
    birth_place: birth_place.value(),
    death_place: death_place.value(),
    name:        name.value(),
    total,
  }
}

/// Outcome of one batch-scoring run over the relations table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringReport {
  /// Relations scored normally.
  pub scored: usize,
  /// Relations whose computation failed and received the error sentinel.
  pub failed: usize,
}

#[cfg(test)]
mod tests {
  use super::*;
  use dates::PRECISION_DAY;

  fn full_agreement_facts() -> RelationFacts {
    RelationFacts {
      candidate_label:        Some("Jean Dupont".to_string()),
      candidate_birth_dates:  vec![DatedValue::new(
        "1867-05-14",
        Some(PRECISION_DAY),
      )],
      candidate_death_dates:  vec![DatedValue::new(
        "1901-02-03",
        Some(PRECISION_DAY),
      )],
      candidate_birth_places: vec!["Paris".to_string()],
      candidate_death_places: vec!["Lyon".to_string()],
      tms_name:               "Jean Dupont".to_string(),
      tms_birth_dates:        vec![DatedValue::new(
        "1867-05-14",
        Some(PRECISION_DAY),
      )],
      tms_death_dates:        vec![DatedValue::new(
        "1901-02-03",
        Some(PRECISION_DAY),
      )],
      tms_birth_places:       vec!["Paris, France".to_string()],
      tms_death_places:       vec!["Lyon".to_string()],
    }
  }

  #[test]
  fn full_agreement_scores_plus_five() {
    let scores = score_relation(&full_agreement_facts());
    assert_eq!(scores.total, 5);
  }

  #[test]
  fn total_is_the_sum_of_field_flags() {
    let mut facts = full_agreement_facts();
    facts.candidate_death_places = vec!["Marseille".to_string()];
    facts.candidate_birth_dates.clear();

    let scores = score_relation(&facts);
    assert_eq!(
      scores.total,
      scores.birth_date
        + scores.death_date
        + scores.birth_place
        + scores.death_place
        + scores.name,
    );
    assert_eq!(scores.birth_date, 0);
    assert_eq!(scores.death_place, -1);
  }

  #[test]
  fn missing_label_counts_as_no_name_data() {
    let mut facts = full_agreement_facts();
    facts.candidate_label = None;
    let scores = score_relation(&facts);
    assert_eq!(scores.name, 0);
  }
}
