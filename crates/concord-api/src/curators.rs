//! Handlers for `/curators` endpoints.
//!
//! Preferences travel in their list form (`["painting","untagged"]` or
//! `["all"]`) and are parsed into
//! [`concord_core::curator::DomainPreferences`] at this boundary.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use concord_core::{
  curator::{Curator, DomainPreferences},
  enrich::FactSource,
  store::AlignmentStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub preferences: Vec<String>,
}

/// `POST /curators` — body: `{"name":"alice","preferences":["all"]}`
pub async fn create<S, F>(
  State(state): State<AppState<S, F>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  let preferences = DomainPreferences::parse(&body.preferences)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let curator = state
    .store
    .add_curator(body.name, preferences)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(curator)))
}

/// `GET /curators/:id`
pub async fn get_one<S, F>(
  State(state): State<AppState<S, F>>,
  Path(id): Path<i64>,
) -> Result<Json<Curator>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  let curator = state
    .store
    .get_curator(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("curator {id} not found")))?;
  Ok(Json(curator))
}

#[derive(Debug, Deserialize)]
pub struct PreferencesBody {
  pub preferences: Vec<String>,
}

/// `PUT /curators/:id/preferences` — body: `{"preferences":["painting"]}`
pub async fn set_preferences<S, F>(
  State(state): State<AppState<S, F>>,
  Path(id): Path<i64>,
  Json(body): Json<PreferencesBody>,
) -> Result<Json<Curator>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  crate::review::require_curator(&state, id).await?;

  let preferences = DomainPreferences::parse(&body.preferences)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  state
    .store
    .set_preferences(id, preferences)
    .await
    .map_err(ApiError::store)?;

  let curator = state
    .store
    .get_curator(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("curator {id} not found")))?;
  Ok(Json(curator))
}
