//! Decision history — the audit trail of curator actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a curator did with one match relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
  Validated,
  Refused,
  Skipped,
}

impl DecisionAction {
  /// The discriminant string stored in the `action` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Validated => "validated",
      Self::Refused => "refused",
      Self::Skipped => "skipped",
    }
  }
}

/// One curator action against one match relation.
///
/// Rows are append-only, with one exception: `undo` hard-deletes the rows it
/// reverses rather than appending compensating entries. That discards audit
/// evidence and is a deliberate carry-over of the source system's behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub history_id:  i64,
  pub curator_id:  i64,
  pub match_id:    i64,
  pub action:      DecisionAction,
  pub recorded_at: DateTime<Utc>,
}

/// Counts returned by the ledger write operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionSummary {
  pub validated: usize,
  pub refused:   usize,
  pub skipped:   usize,
}

/// Per-kind removal counts returned by `undo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoSummary {
  pub validated: usize,
  pub refused:   usize,
  pub skipped:   usize,
}

impl UndoSummary {
  pub fn total(&self) -> usize { self.validated + self.refused + self.skipped }
}
