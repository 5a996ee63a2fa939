//! JSON REST API for Concord.
//!
//! Exposes an axum [`Router`] backed by any
//! [`concord_core::store::AlignmentStore`], plus an optional
//! [`concord_core::enrich::FactSource`] for best-effort candidate display
//! data. Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", concord_api::api_router(state))
//! ```

pub mod curators;
pub mod entities;
pub mod error;
pub mod review;
pub mod scoring;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use concord_core::{enrich::FactSource, store::AlignmentStore};

pub use error::ApiError;

/// Shared state threaded through all axum handlers.
pub struct AppState<S, F> {
  pub store: Arc<S>,
  /// When absent, review assignments go out un-enriched.
  pub facts: Option<Arc<F>>,
}

// Manual impl: `#[derive(Clone)]` would demand `S: Clone` and `F: Clone`.
impl<S, F> Clone for AppState<S, F> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), facts: self.facts.clone() }
  }
}

/// A [`FactSource`] that never returns anything; for deployments without a
/// knowledge-base query service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

impl FactSource for NoEnrichment {
  type Error = std::convert::Infallible;

  async fn facts_for(
    &self,
    _qids: &[String],
  ) -> Result<
    std::collections::HashMap<String, concord_core::enrich::CandidateFactSet>,
    Self::Error,
  > {
    Ok(std::collections::HashMap::new())
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, F>(state: AppState<S, F>) -> Router<()>
where
  S: AlignmentStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  F: FactSource + 'static,
{
  Router::new()
    // Review loop
    .route("/review/next", get(review::next::<S, F>))
    .route("/review/{tms_id}/validate", post(review::validate::<S, F>))
    .route("/review/{tms_id}/refuse", post(review::refuse::<S, F>))
    .route("/review/{tms_id}/skip", post(review::skip::<S, F>))
    .route("/review/{tms_id}/undo", post(review::undo::<S, F>))
    // Batch scoring
    .route("/scoring/run", post(scoring::run::<S, F>))
    // Curators
    .route("/curators", post(curators::create::<S, F>))
    .route("/curators/{id}", get(curators::get_one::<S, F>))
    .route(
      "/curators/{id}/preferences",
      put(curators::set_preferences::<S, F>),
    )
    // Entities
    .route("/entities/{tms_id}", get(entities::get_one::<S, F>))
    .with_state(state)
}
