//! Match relation — one (TMS entity, candidate) pairing and its scores.

use serde::{Deserialize, Serialize};

/// Sentinel written into every flag column of a relation whose scoring
/// computation failed. Chosen to be unmistakable next to the normal −5..=+5
/// aggregate range.
pub const SCORE_ERROR_SENTINEL: i32 = -999;

/// The five field-level flags plus their sum, for one relation.
///
/// Each field flag is +1 (agreement), −1 (disagreement) or 0 (insufficient
/// data — or, for the name flag, close-but-uncertain; the two meanings
/// deliberately share a value). On a per-relation computation failure all six
/// hold [`SCORE_ERROR_SENTINEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldScores {
  pub birth_date:  i32,
  pub death_date:  i32,
  pub birth_place: i32,
  pub death_place: i32,
  pub name:        i32,
  pub total:       i32,
}

impl FieldScores {
  /// All six columns set to the error sentinel.
  pub fn error() -> Self {
    Self {
      birth_date:  SCORE_ERROR_SENTINEL,
      death_date:  SCORE_ERROR_SENTINEL,
      birth_place: SCORE_ERROR_SENTINEL,
      death_place: SCORE_ERROR_SENTINEL,
      name:        SCORE_ERROR_SENTINEL,
      total:       SCORE_ERROR_SENTINEL,
    }
  }

  pub fn is_error(&self) -> bool { self.total == SCORE_ERROR_SENTINEL }
}

/// Pairs one TMS entity with one candidate. Many relations may reference the
/// same entity (1 TMS : N candidates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRelation {
  pub match_id:  i64,
  pub tms_id:    i64,
  pub qid:       String,
  /// Similarity score supplied by the external reconciliation API, if any.
  pub api_score: Option<f64>,
  /// `None` until batch scoring has run over this relation.
  pub flags:     Option<FieldScores>,
}
