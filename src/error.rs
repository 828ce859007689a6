//! Error types for lifeops
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown ids, run state conflicts)
//! - 4: Operation failed (I/O, serialization, lock contention)
//!
//! Corrupt or missing persisted collections are not errors: they are
//! recovered by the stores (see [`ParseError`]); a bad record inside a
//! collection never costs the others.

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the lifeops CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for lifeops operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("An emergency run is already active: {0}")]
    RunActive(String),

    #[error("No active emergency run")]
    NoActiveRun,

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::NotFound { .. }
            | Error::RunActive(_)
            | Error::NoActiveRun => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error payloads
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "kind": kind,
                "id": id,
            })),
            Error::RunActive(run_id) => Some(serde_json::json!({ "run_id": run_id })),
            Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.display().to_string(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for lifeops operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a persisted collection could not be decoded as a whole.
///
/// Stores never return this to their callers; it is the input to the
/// "default to empty" recovery policy in [`crate::storage::load_or_empty`].
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("stored value is not valid JSON: {0}")]
    Syntax(serde_json::Error),

    #[error("stored value is not an array")]
    NotAnArray,
}

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
