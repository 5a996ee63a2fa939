//! Handler for `/entities/:tms_id` — read-only entity detail.

use axum::{
  Json,
  extract::{Path, State},
};
use concord_core::{
  enrich::FactSource,
  entity::TmsEntity,
  history::HistoryEntry,
  relation::MatchRelation,
  store::AlignmentStore,
};
use serde::Serialize;

use crate::{AppState, error::ApiError, review::require_entity};

/// An entity with its candidate pairings and decision trail.
#[derive(Debug, Serialize)]
pub struct EntityDetail {
  pub entity:    TmsEntity,
  pub relations: Vec<MatchRelation>,
  pub history:   Vec<HistoryEntry>,
}

/// `GET /entities/:tms_id`
pub async fn get_one<S, F>(
  State(state): State<AppState<S, F>>,
  Path(tms_id): Path<i64>,
) -> Result<Json<EntityDetail>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  let entity = require_entity(&state, tms_id).await?;
  let relations = state
    .store
    .relations_for_entity(tms_id)
    .await
    .map_err(ApiError::store)?;
  let history = state
    .store
    .history_for_entity(tms_id)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(EntityDetail { entity, relations, history }))
}
