//! Boundary to the knowledge-base retrieval collaborator.
//!
//! The remote query service is an external system; this core only fixes the
//! shape of what it returns. Enrichment is best-effort display material — its
//! absence or failure never blocks scheduling or decision recording.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::score::dates::DatedValue;

/// Structured facts for one candidate, as returned by the remote service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateFactSet {
  pub label:        Option<String>,
  pub description:  Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub birth_dates:  Vec<FactDate>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub death_dates:  Vec<FactDate>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub birth_places: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub death_places: Vec<String>,
}

/// A date with its precision code, in the wire shape of the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactDate {
  pub date:      String,
  pub precision: Option<u8>,
}

impl From<FactDate> for DatedValue {
  fn from(fd: FactDate) -> Self { DatedValue::new(fd.date, fd.precision) }
}

/// A source of candidate facts, keyed by QID.
///
/// Implementations are expected to batch: one call per review assignment,
/// not one per candidate. Errors are the implementation's own type; callers
/// degrade to un-enriched display on any failure.
pub trait FactSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn facts_for<'a>(
    &'a self,
    qids: &'a [String],
  ) -> impl Future<Output = Result<HashMap<String, CandidateFactSet>, Self::Error>>
  + Send
  + 'a;
}
