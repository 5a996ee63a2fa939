//! The `AlignmentStore` trait and supporting input types.
//!
//! The trait is implemented by storage backends (e.g.
//! `concord-store-sqlite`). Higher layers (`concord-api`) depend on this
//! abstraction, not on any concrete backend.
//!
//! Locking is cooperative data, not a language-level lock, so every method
//! that reads and then writes shared rows — the scheduler and all four ledger
//! operations — MUST execute as a single serialised transaction in the
//! backend. No raw row mutation is exposed outside this trait.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  candidate::{Candidate, CandidatePlace},
  curator::{Curator, DomainPreferences},
  entity::{TmsEntity, ValidationStatus, VitalEvent},
  history::{DecisionAction, DecisionSummary, HistoryEntry, UndoSummary},
  relation::MatchRelation,
  score::ScoringReport,
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// Input for importing a TMS entity. The catalog key is caller-supplied;
/// entities are never created by this core outside the ETL boundary.
#[derive(Debug, Clone)]
pub struct NewEntity {
  pub tms_id:       i64,
  pub display_name: String,
  pub domains:      Option<Vec<String>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Concord storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AlignmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Curators ──────────────────────────────────────────────────────────

  fn add_curator(
    &self,
    name: String,
    preferences: DomainPreferences,
  ) -> impl Future<Output = Result<Curator, Self::Error>> + Send + '_;

  fn get_curator(
    &self,
    curator_id: i64,
  ) -> impl Future<Output = Result<Option<Curator>, Self::Error>> + Send + '_;

  fn set_preferences(
    &self,
    curator_id: i64,
    preferences: DomainPreferences,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── ETL imports ───────────────────────────────────────────────────────

  fn add_entity(
    &self,
    input: NewEntity,
  ) -> impl Future<Output = Result<TmsEntity, Self::Error>> + Send + '_;

  fn get_entity(
    &self,
    tms_id: i64,
  ) -> impl Future<Output = Result<Option<TmsEntity>, Self::Error>> + Send + '_;

  fn add_entity_event(
    &self,
    tms_id: i64,
    event: VitalEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_candidate(
    &self,
    candidate: Candidate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_candidate<'a>(
    &'a self,
    qid: &'a str,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + 'a;

  fn add_candidate_event<'a>(
    &'a self,
    qid: &'a str,
    event: VitalEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn add_candidate_place<'a>(
    &'a self,
    qid: &'a str,
    place: CandidatePlace,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Pair an entity with a candidate. `api_score` is the external
  /// reconciliation API's similarity, if any; field flags start unscored.
  fn add_relation<'a>(
    &'a self,
    tms_id: i64,
    qid: &'a str,
    api_score: Option<f64>,
  ) -> impl Future<Output = Result<MatchRelation, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn relations_for_entity(
    &self,
    tms_id: i64,
  ) -> impl Future<Output = Result<Vec<MatchRelation>, Self::Error>> + Send + '_;

  fn history_for_entity(
    &self,
    tms_id: i64,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;

  // ── Batch scoring ─────────────────────────────────────────────────────

  /// Score every relation: run the comparators and write the six flag
  /// columns. A failure on one relation writes the error sentinel for that
  /// relation only and never aborts the batch.
  fn run_scoring(
    &self,
  ) -> impl Future<Output = Result<ScoringReport, Self::Error>> + Send + '_;

  // ── Scheduler ─────────────────────────────────────────────────────────

  /// Select, lock and return the next entity for `curator_id`.
  ///
  /// Expires stale locks, filters by status / skips / preferences / locks,
  /// ranks by candidate score quality and acquires the lock — all in one
  /// transaction. `now` defaults to the current time; tests pass it
  /// explicitly to exercise lock expiry.
  ///
  /// `Ok(None)` means nothing is eligible, which is a normal outcome.
  fn next_entity(
    &self,
    curator_id: i64,
    now: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Option<TmsEntity>, Self::Error>> + Send + '_;

  // ── Decision ledger ───────────────────────────────────────────────────

  /// Record Validated for the selected candidates and Refused for the rest,
  /// set the entity's status to Aligned and release its lock. Errors if the
  /// selection is empty or the entity has no relations; commits atomically.
  fn record_validation<'a>(
    &'a self,
    tms_id: i64,
    curator_id: i64,
    selected_qids: &'a [String],
  ) -> impl Future<Output = Result<DecisionSummary, Self::Error>> + Send + 'a;

  /// Record Refused for every candidate, set status NotAligned, release the
  /// lock.
  fn record_refuse_all(
    &self,
    tms_id: i64,
    curator_id: i64,
  ) -> impl Future<Output = Result<DecisionSummary, Self::Error>> + Send + '_;

  /// Record Skipped for every candidate and release the lock. The status
  /// stays unset: the entity remains schedulable for other curators but is
  /// excluded from this curator's future pool.
  fn record_skip(
    &self,
    tms_id: i64,
    curator_id: i64,
  ) -> impl Future<Output = Result<DecisionSummary, Self::Error>> + Send + '_;

  /// Delete this curator's history rows of the given kinds for the entity's
  /// relations and clear the entity's validation status. Errors (rather
  /// than silently no-opping) when nothing matched.
  fn undo<'a>(
    &'a self,
    tms_id: i64,
    curator_id: i64,
    kinds: &'a [DecisionAction],
  ) -> impl Future<Output = Result<UndoSummary, Self::Error>> + Send + 'a;

  /// Directly set (or clear) an entity's validation status. Used by the ETL
  /// to mark community-matched entities out of the review pool.
  fn set_status(
    &self,
    tms_id: i64,
    status: Option<ValidationStatus>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
