//! The swap transaction engine and its read-only query service.
//!
//! [`SwapEngine`] is a stateless coordinator over the slot and
//! swap-request stores: every mutating operation runs as one PostgreSQL
//! transaction that locks the affected rows in a fixed global order, so
//! multiple engine instances can serve concurrent callers against the
//! same database.

pub mod config;
pub mod engine;
mod error;

pub use config::EngineConfig;
pub use engine::{SwapEngine, SwapOutcome};
