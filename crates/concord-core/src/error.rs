//! Error types for `concord-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("entity not found: {0}")]
  EntityNotFound(i64),

  #[error("curator not found: {0}")]
  CuratorNotFound(i64),

  #[error("no match relations exist for entity {0}")]
  NoRelations(i64),

  #[error("no matching history entries to undo for entity {0}")]
  NothingToUndo(i64),

  #[error("invalid domain preferences: {0}")]
  InvalidPreferences(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
