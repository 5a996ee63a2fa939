//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (domain
//! tags, preferences) are stored as compact JSON. Enum discriminants are
//! stored as the snake_case strings their serde tags use.

use chrono::{DateTime, Utc};
use concord_core::{
  candidate::CandidateKind,
  curator::{Curator, DomainPreferences},
  entity::{EventKind, LockState, TmsEntity, ValidationStatus},
  history::{DecisionAction, HistoryEntry},
  relation::{FieldScores, MatchRelation},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ValidationStatus ────────────────────────────────────────────────────────

pub fn encode_status(s: ValidationStatus) -> &'static str {
  match s {
    ValidationStatus::Aligned => "aligned",
    ValidationStatus::NotAligned => "not_aligned",
    ValidationStatus::CommunityMatched => "community_matched",
  }
}

pub fn decode_status(s: &str) -> Result<ValidationStatus> {
  match s {
    "aligned" => Ok(ValidationStatus::Aligned),
    "not_aligned" => Ok(ValidationStatus::NotAligned),
    "community_matched" => Ok(ValidationStatus::CommunityMatched),
    other => {
      Err(Error::Decode(format!("unknown validation status: {other:?}")))
    }
  }
}

// ─── EventKind ───────────────────────────────────────────────────────────────

pub fn encode_event_kind(k: EventKind) -> &'static str {
  match k {
    EventKind::Birth => "birth",
    EventKind::Death => "death",
  }
}

// ─── CandidateKind ───────────────────────────────────────────────────────────

pub fn encode_candidate_kind(k: CandidateKind) -> &'static str {
  match k {
    CandidateKind::Person => "person",
    CandidateKind::Other => "other",
  }
}

pub fn decode_candidate_kind(s: &str) -> Result<CandidateKind> {
  match s {
    "person" => Ok(CandidateKind::Person),
    "other" => Ok(CandidateKind::Other),
    other => {
      Err(Error::Decode(format!("unknown candidate kind: {other:?}")))
    }
  }
}

// ─── DecisionAction ──────────────────────────────────────────────────────────

pub fn decode_action(s: &str) -> Result<DecisionAction> {
  match s {
    "validated" => Ok(DecisionAction::Validated),
    "refused" => Ok(DecisionAction::Refused),
    "skipped" => Ok(DecisionAction::Skipped),
    other => {
      Err(Error::Decode(format!("unknown decision action: {other:?}")))
    }
  }
}

// ─── Domain tags / preferences ───────────────────────────────────────────────

pub fn encode_domains(domains: &[String]) -> Result<String> {
  Ok(serde_json::to_string(domains)?)
}

pub fn decode_domains(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_preferences(prefs: &DomainPreferences) -> Result<String> {
  Ok(serde_json::to_string(prefs)?)
}

pub fn decode_preferences(s: &str) -> Result<DomainPreferences> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `tms_entities` row.
pub struct RawEntity {
  pub tms_id:       i64,
  pub display_name: String,
  pub domains:      Option<String>,
  pub status:       Option<String>,
  pub locked_by:    Option<i64>,
  pub locked_at:    Option<String>,
}

impl RawEntity {
  pub fn into_entity(self) -> Result<TmsEntity> {
    let domains = self.domains.as_deref().map(decode_domains).transpose()?;
    let status = self.status.as_deref().map(decode_status).transpose()?;

    let lock = match (self.locked_by, self.locked_at) {
      (Some(held_by), Some(at_str)) => {
        Some(LockState { held_by, acquired_at: decode_dt(&at_str)? })
      }
      _ => None,
    };

    Ok(TmsEntity {
      tms_id: self.tms_id,
      display_name: self.display_name,
      domains,
      status,
      lock,
    })
  }
}

/// Raw strings read directly from a `curators` row.
pub struct RawCurator {
  pub curator_id:  i64,
  pub name:        String,
  pub preferences: String,
  pub created_at:  String,
}

impl RawCurator {
  pub fn into_curator(self) -> Result<Curator> {
    Ok(Curator {
      curator_id:  self.curator_id,
      name:        self.name,
      preferences: decode_preferences(&self.preferences)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `match_relations` row. The six flag
/// columns are either all set or all NULL; a half-written row is treated as
/// unscored.
pub struct RawRelation {
  pub match_id:    i64,
  pub tms_id:      i64,
  pub qid:         String,
  pub api_score:   Option<f64>,
  pub birth_date:  Option<i32>,
  pub death_date:  Option<i32>,
  pub birth_place: Option<i32>,
  pub death_place: Option<i32>,
  pub name:        Option<i32>,
  pub total:       Option<i32>,
}

impl RawRelation {
  pub fn into_relation(self) -> MatchRelation {
    let flags = match (
      self.birth_date,
      self.death_date,
      self.birth_place,
      self.death_place,
      self.name,
      self.total,
    ) {
      (
        Some(birth_date),
        Some(death_date),
        Some(birth_place),
        Some(death_place),
        Some(name),
        Some(total),
      ) => Some(FieldScores {
        birth_date,
        death_date,
        birth_place,
        death_place,
        name,
        total,
      }),
      _ => None,
    };

    MatchRelation {
      match_id: self.match_id,
      tms_id: self.tms_id,
      qid: self.qid,
      api_score: self.api_score,
      flags,
    }
  }
}

/// Raw strings read directly from a `history` row.
pub struct RawHistory {
  pub history_id:  i64,
  pub curator_id:  i64,
  pub match_id:    i64,
  pub action:      String,
  pub recorded_at: String,
}

impl RawHistory {
  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      history_id:  self.history_id,
      curator_id:  self.curator_id,
      match_id:    self.match_id,
      action:      decode_action(&self.action)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
