//! Error types for the jsonmend core library.

use crate::document::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status for setup failures (missing target, bad arguments, watcher setup).
pub const EXIT_SETUP: u8 = 1;

/// Exit status for a repair chain that exhausted one of its budgets.
pub const EXIT_REPAIR_FAILED: u8 = 2;

/// Core error types for jsonmend operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Parse(ParseError),

    #[error("Target file does not exist: {0}")]
    TargetMissing(PathBuf),

    #[error("File watcher error: {0}")]
    Watcher(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Repair failed after {attempts} retries: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Repair gave up after {edits} corrective edits")]
    EditBudgetExhausted { edits: u32 },
}

impl Error {
    /// Whether this error ends a repair chain (as opposed to a setup failure).
    pub fn is_repair_failure(&self) -> bool {
        matches!(
            self,
            Error::RetriesExhausted { .. } | Error::EditBudgetExhausted { .. }
        )
    }

    /// Process exit status that reports this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_repair_failure() {
            EXIT_REPAIR_FAILED
        } else {
            EXIT_SETUP
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

/// Result type alias using the jsonmend Error type.
pub type Result<T> = std::result::Result<T, Error>;
