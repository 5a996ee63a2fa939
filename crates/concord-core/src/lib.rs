//! Core types and trait definitions for the Concord reconciliation engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod candidate;
pub mod curator;
pub mod enrich;
pub mod entity;
pub mod error;
pub mod history;
pub mod relation;
pub mod schedule;
pub mod score;
pub mod store;

pub use error::{Error, Result};
