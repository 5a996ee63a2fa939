//! Handlers for the `/review` endpoints — the curator work loop.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/review/next?curator_id=<id>` | Assign and lock the next entity; `null` when nothing is eligible |
//! | `POST` | `/review/:tms_id/validate` | Body: `{"curator_id":1,"selected_qids":["Q1"]}` |
//! | `POST` | `/review/:tms_id/refuse` | Body: `{"curator_id":1}` |
//! | `POST` | `/review/:tms_id/skip` | Body: `{"curator_id":1}` |
//! | `POST` | `/review/:tms_id/undo` | Body: `{"curator_id":1,"kinds":["validated"]}`; kinds default to all |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use concord_core::{
  candidate::Candidate,
  enrich::{CandidateFactSet, FactSource},
  entity::TmsEntity,
  history::{DecisionAction, DecisionSummary, UndoSummary},
  relation::MatchRelation,
  store::AlignmentStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Assignment ──────────────────────────────────────────────────────────────

/// Everything a review screen needs for one assigned entity.
#[derive(Debug, Serialize)]
pub struct ReviewAssignment {
  pub entity:     TmsEntity,
  pub candidates: Vec<CandidateReview>,
}

/// One candidate pairing, with whatever display material is on hand.
#[derive(Debug, Serialize)]
pub struct CandidateReview {
  pub relation:  MatchRelation,
  /// `None` when the relation's qid has no imported candidate row.
  pub candidate: Option<Candidate>,
  /// Best-effort enrichment from the knowledge-base query service.
  pub facts:     Option<CandidateFactSet>,
}

#[derive(Debug, Deserialize)]
pub struct NextParams {
  pub curator_id: i64,
}

/// `GET /review/next?curator_id=<id>`
///
/// Returns `null` (not 404) when nothing is eligible: an empty pool is a
/// normal outcome of the review loop.
pub async fn next<S, F>(
  State(state): State<AppState<S, F>>,
  Query(params): Query<NextParams>,
) -> Result<Json<Option<ReviewAssignment>>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  require_curator(&state, params.curator_id).await?;

  let Some(entity) = state
    .store
    .next_entity(params.curator_id, None)
    .await
    .map_err(ApiError::store)?
  else {
    return Ok(Json(None));
  };

  let mut relations = state
    .store
    .relations_for_entity(entity.tms_id)
    .await
    .map_err(ApiError::store)?;
  // Strongest external similarity first; unscored relations sink to the end.
  relations.sort_by(|a, b| {
    b.api_score
      .unwrap_or(f64::NEG_INFINITY)
      .total_cmp(&a.api_score.unwrap_or(f64::NEG_INFINITY))
  });

  let qids: Vec<String> =
    relations.iter().map(|r| r.qid.clone()).collect();
  let mut fact_sets = match &state.facts {
    Some(source) => match source.facts_for(&qids).await {
      Ok(sets) => sets,
      Err(e) => {
        // Enrichment never blocks review.
        tracing::warn!(error = %e, "candidate enrichment failed");
        Default::default()
      }
    },
    None => Default::default(),
  };

  let mut candidates = Vec::with_capacity(relations.len());
  for relation in relations {
    let candidate = state
      .store
      .get_candidate(&relation.qid)
      .await
      .map_err(ApiError::store)?;
    let facts = fact_sets.remove(&relation.qid);
    candidates.push(CandidateReview { relation, candidate, facts });
  }

  Ok(Json(Some(ReviewAssignment { entity, candidates })))
}

// ─── Decisions ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ValidateBody {
  pub curator_id:    i64,
  pub selected_qids: Vec<String>,
}

/// `POST /review/:tms_id/validate`
pub async fn validate<S, F>(
  State(state): State<AppState<S, F>>,
  Path(tms_id): Path<i64>,
  Json(body): Json<ValidateBody>,
) -> Result<Json<DecisionSummary>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  if body.selected_qids.is_empty() {
    return Err(ApiError::BadRequest(
      "at least one candidate must be selected; use refuse to reject them all"
        .to_string(),
    ));
  }

  require_curator(&state, body.curator_id).await?;
  let relations = require_relations(&state, tms_id).await?;

  for qid in &body.selected_qids {
    if !relations.iter().any(|r| &r.qid == qid) {
      return Err(ApiError::BadRequest(format!(
        "{qid} is not a candidate of entity {tms_id}"
      )));
    }
  }

  let summary = state
    .store
    .record_validation(tms_id, body.curator_id, &body.selected_qids)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
  pub curator_id: i64,
}

/// `POST /review/:tms_id/refuse`
pub async fn refuse<S, F>(
  State(state): State<AppState<S, F>>,
  Path(tms_id): Path<i64>,
  Json(body): Json<DecisionBody>,
) -> Result<Json<DecisionSummary>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  require_curator(&state, body.curator_id).await?;
  require_relations(&state, tms_id).await?;

  let summary = state
    .store
    .record_refuse_all(tms_id, body.curator_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summary))
}

/// `POST /review/:tms_id/skip`
pub async fn skip<S, F>(
  State(state): State<AppState<S, F>>,
  Path(tms_id): Path<i64>,
  Json(body): Json<DecisionBody>,
) -> Result<Json<DecisionSummary>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  require_curator(&state, body.curator_id).await?;
  require_relations(&state, tms_id).await?;

  let summary = state
    .store
    .record_skip(tms_id, body.curator_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summary))
}

// ─── Undo ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UndoBody {
  pub curator_id: i64,
  /// Which decision kinds to reverse; all three when omitted.
  pub kinds:      Option<Vec<DecisionAction>>,
}

/// `POST /review/:tms_id/undo`
///
/// 409 when the curator has nothing of the requested kinds to undo —
/// a no-op undo is a caller mistake, never a silent success.
pub async fn undo<S, F>(
  State(state): State<AppState<S, F>>,
  Path(tms_id): Path<i64>,
  Json(body): Json<UndoBody>,
) -> Result<Json<UndoSummary>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  require_curator(&state, body.curator_id).await?;
  require_entity(&state, tms_id).await?;

  let kinds = body.kinds.unwrap_or_else(|| {
    vec![
      DecisionAction::Validated,
      DecisionAction::Refused,
      DecisionAction::Skipped,
    ]
  });

  let history = state
    .store
    .history_for_entity(tms_id)
    .await
    .map_err(ApiError::store)?;
  let any_match = history.iter().any(|entry| {
    entry.curator_id == body.curator_id && kinds.contains(&entry.action)
  });
  if !any_match {
    return Err(ApiError::Conflict(format!(
      "curator {} has no matching decisions on entity {tms_id} to undo",
      body.curator_id
    )));
  }

  let summary = state
    .store
    .undo(tms_id, body.curator_id, &kinds)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summary))
}

// ─── Shared checks ───────────────────────────────────────────────────────────

pub(crate) async fn require_curator<S, F>(
  state: &AppState<S, F>,
  curator_id: i64,
) -> Result<(), ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .get_curator(curator_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("curator {curator_id} not found")))?;
  Ok(())
}

pub(crate) async fn require_entity<S, F>(
  state: &AppState<S, F>,
  tms_id: i64,
) -> Result<TmsEntity, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .get_entity(tms_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("entity {tms_id} not found")))
}

async fn require_relations<S, F>(
  state: &AppState<S, F>,
  tms_id: i64,
) -> Result<Vec<MatchRelation>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_entity(state, tms_id).await?;
  let relations = state
    .store
    .relations_for_entity(tms_id)
    .await
    .map_err(ApiError::store)?;
  if relations.is_empty() {
    return Err(ApiError::Conflict(format!(
      "entity {tms_id} has no candidates to decide on"
    )));
  }
  Ok(relations)
}
