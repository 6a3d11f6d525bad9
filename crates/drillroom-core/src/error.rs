//! Core error types for drillroom-core.
//!
//! This module defines the error hierarchy using thiserror. Dispatch
//! rejections are ordinary, caller-correctable values -- they are returned,
//! never panicked on, and carry a stable machine-readable code.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::{EventKind, Phase, SessionStatus};

/// Core error type for drillroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A rejected session dispatch
    #[error("Dispatch rejected: {0}")]
    Dispatch(#[from] DispatchError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// No session with status in_progress
    #[error("No session in progress")]
    NoActiveSession,

    /// Session id not present in the store
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// A stored row no longer decodes
    #[error("Corrupt record for session {id}: {message}")]
    CorruptRecord { id: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::QueryFailed(err.to_string())
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// A rejected dispatch.
///
/// Every rejection is a complete no-op: the log is unchanged and no
/// subscriber runs. `code()` gives the stable identifier collaborators
/// surface to users; `Display` gives the human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Identifier outside the closed event set
    #[error("unrecognized event type '{0}'")]
    InvalidEventType(String),

    /// Dispatch after completion or abandonment
    #[error("session is terminated ({0})")]
    SessionTerminated(SessionStatus),

    /// Transition not permitted from the current phase
    #[error("{event} is not allowed from {}", phase_name(.phase))]
    InvalidPhase {
        event: EventKind,
        phase: Option<Phase>,
    },

    /// Nudge requested with zero remaining
    #[error("nudge budget exhausted")]
    NudgeBudgetExhausted,

    /// Malformed or cross-field-invalid reflection payload
    #[error("invalid reflection: {0}")]
    ValidationFailed(String),
}

fn phase_name(phase: &Option<Phase>) -> &'static str {
    match phase {
        Some(p) => p.name(),
        None => "pre-start",
    }
}

impl DispatchError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::InvalidEventType(_) => "INVALID_EVENT_TYPE",
            DispatchError::SessionTerminated(_) => "SESSION_TERMINATED",
            DispatchError::InvalidPhase { .. } => "INVALID_PHASE",
            DispatchError::NudgeBudgetExhausted => "NUDGE_BUDGET_EXHAUSTED",
            DispatchError::ValidationFailed(_) => "VALIDATION_FAILED",
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            DispatchError::InvalidEventType("x".into()).code(),
            "INVALID_EVENT_TYPE"
        );
        assert_eq!(
            DispatchError::SessionTerminated(SessionStatus::Completed).code(),
            "SESSION_TERMINATED"
        );
        assert_eq!(
            DispatchError::InvalidPhase {
                event: EventKind::SessionCompleted,
                phase: Some(Phase::Coding),
            }
            .code(),
            "INVALID_PHASE"
        );
        assert_eq!(
            DispatchError::NudgeBudgetExhausted.code(),
            "NUDGE_BUDGET_EXHAUSTED"
        );
        assert_eq!(
            DispatchError::ValidationFailed("bad".into()).code(),
            "VALIDATION_FAILED"
        );
    }

    #[test]
    fn invalid_phase_message_names_both_sides() {
        let err = DispatchError::InvalidPhase {
            event: EventKind::SilentEnded,
            phase: None,
        };
        let message = err.to_string();
        assert!(message.contains("silent.ended"));
        assert!(message.contains("pre-start"));
    }
}
