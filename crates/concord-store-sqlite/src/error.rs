//! Error type for `concord-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] concord_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unrecognised stored value: {0}")]
  Decode(String),

  #[error("entity not found: {0}")]
  EntityNotFound(i64),

  #[error("curator not found: {0}")]
  CuratorNotFound(i64),

  #[error("no match relations exist for entity {0}")]
  NoRelations(i64),

  /// A validation must select at least one candidate; aligning an entity
  /// while refusing every candidate is contradictory.
  #[error("no candidates selected for entity {0}")]
  EmptySelection(i64),

  /// Undo matched nothing; reported to the caller, never a silent no-op.
  #[error("no matching history entries to undo for entity {0}")]
  NothingToUndo(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
