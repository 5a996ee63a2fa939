//! SQLite backend for the Concord alignment store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Every scheduler and ledger
//! operation executes inside a single rusqlite transaction; the single
//! connection serialises concurrent curators.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DEFAULT_INACTIVITY_TIMEOUT, SqliteStore};

#[cfg(test)]
mod tests;
