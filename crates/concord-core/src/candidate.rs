//! Candidate — an external knowledge-base record proposed as a match.
//!
//! Candidates are produced by the ETL and are immutable from this core's
//! perspective. Their vital events reuse [`crate::entity::VitalEvent`];
//! place-of-birth/place-of-death names live in separate [`CandidatePlace`]
//! rows because the knowledge base can assert several per event.

use serde::{Deserialize, Serialize};

use crate::entity::EventKind;

/// Coarse type tag: the scoring heuristics only distinguish people from
/// everything else (organisations, places, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
  Person,
  Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
  /// Knowledge-base identifier (e.g. `"Q1234"`). Unique.
  pub qid:   String,
  pub kind:  CandidateKind,
  pub label: Option<String>,
}

/// One asserted place of birth or death for a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePlace {
  pub kind: EventKind,
  pub name: String,
}
