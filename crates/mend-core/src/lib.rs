//! Core types for jsonmend, the self-healing JSON file watcher.
//!
//! This crate provides the repair engine and everything it depends on:
//! parse/serialize primitives, the shared cooldown timestamp, the document
//! store seam, configuration and the error taxonomy.

pub mod config;
pub mod cooldown;
pub mod document;
pub mod error;
pub mod repair;
pub mod store;

pub use config::{MendConfig, RepairConfig, WatchConfig};
pub use cooldown::Cooldown;
pub use document::{ParseError, ParseErrorKind};
pub use error::{Error, Result, EXIT_REPAIR_FAILED, EXIT_SETUP};
pub use repair::{RepairEngine, RepairOutcome};
pub use store::{DocumentStore, FileStore};
