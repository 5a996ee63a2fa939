//! TMS entity — a catalog record awaiting identity reconciliation.
//!
//! The entity itself is a thin envelope: its vital events live in separate
//! rows, and its candidate pairings live in [`crate::relation::MatchRelation`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The curator-assigned outcome of reviewing an entity.
/// `None` (column NULL) means the entity has not been reviewed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
  /// At least one candidate was validated.
  Aligned,
  /// Every candidate was refused.
  NotAligned,
  /// Matched upstream by the knowledge-base community; skipped by curators.
  CommunityMatched,
}

/// A cooperative, expiry-based claim on an entity by one curator.
///
/// The lock is plain row data, not a language-level lock: it only means
/// anything because every scheduler and ledger operation honours it inside a
/// serialised store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
  pub held_by:     i64,
  pub acquired_at: DateTime<Utc>,
}

impl LockState {
  /// An expired lock is logically free even before its columns are cleared.
  pub fn is_live(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
    now - self.acquired_at < timeout
  }
}

/// A catalog record awaiting reconciliation.
///
/// Created by an external ETL import; this core mutates only the lock and
/// status fields, and never deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmsEntity {
  pub tms_id:       i64,
  pub display_name: String,
  /// Documentation-domain tags. `None` means the entity is untagged, which is
  /// distinct from an empty tag list for preference matching.
  pub domains:      Option<Vec<String>>,
  pub status:       Option<ValidationStatus>,
  pub lock:         Option<LockState>,
}

impl TmsEntity {
  /// Whether a *live* lock held by someone other than `curator_id` exists.
  pub fn locked_by_other(
    &self,
    curator_id: i64,
    now: DateTime<Utc>,
    timeout: Duration,
  ) -> bool {
    match &self.lock {
      Some(lock) => lock.held_by != curator_id && lock.is_live(now, timeout),
      None => false,
    }
  }
}

// ─── Vital events ────────────────────────────────────────────────────────────

/// Which life event a date or place belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
  Birth,
  Death,
}

/// One dated event attached to a TMS entity or a candidate.
///
/// Dates are kept as the loosely-formatted strings the ETL produces
/// (`"1867"`, `"1867-05"`, `"1867-05-14"`); the date comparator completes and
/// truncates them itself. TMS events may also carry a place name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalEvent {
  pub kind:      EventKind,
  pub date:      Option<String>,
  /// Knowledge-base precision code (millennium 6 … day 11). Missing or
  /// malformed codes are treated as day precision by the comparator.
  pub precision: Option<u8>,
  pub place:     Option<String>,
}
