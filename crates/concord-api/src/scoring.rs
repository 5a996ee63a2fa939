//! Handler for `/scoring/run` — trigger a batch-scoring pass.

use axum::{Json, extract::State};
use concord_core::{
  enrich::FactSource, score::ScoringReport, store::AlignmentStore,
};

use crate::{AppState, error::ApiError};

/// `POST /scoring/run` — returns `{"scored":N,"failed":M}`.
///
/// Runs synchronously; the caller waits for the pass to finish. Relations
/// whose computation failed carry the error sentinel afterwards and are
/// reported in `failed`.
pub async fn run<S, F>(
  State(state): State<AppState<S, F>>,
) -> Result<Json<ScoringReport>, ApiError>
where
  S: AlignmentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource,
{
  let report = state.store.run_scoring().await.map_err(ApiError::store)?;
  Ok(Json(report))
}
