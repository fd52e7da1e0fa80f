use chrono::{DateTime, Utc};
use http::StatusCode;
use thiserror::Error;

/// Failures surfaced by the log search core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LogSearchError {
    /// A preset outside the plan's retention window was resolved.
    /// The UI must never offer such a preset, so this is a programming error.
    #[error("Policy violation for preset '{preset}': {reason}")]
    PolicyViolation { preset: String, reason: String },

    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Requested range ends at {to} which is before the earliest retained instant {earliest}")]
    RangeOutsideRetention {
        to: DateTime<Utc>,
        earliest: DateTime<Utc>,
    },

    #[error("Log search transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Response decoding error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LogSearchError {
    /// Transport failures are the only kind a user can recover from by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LogSearchError::Transport { .. })
    }
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Helper for mapping a network-level failure into a transport error
pub fn transport_error<E: ToString>(err: E) -> LogSearchError {
    LogSearchError::Transport {
        status: None,
        message: err.to_string(),
    }
}

/// Failures raised by the generic grid.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column is not sortable: {0}")]
    ColumnNotSortable(String),

    #[error("Duplicate row id: {0}")]
    DuplicateRowId(String),
}

/// A JSON blob on a log record that could not be parsed.
///
/// Never fails a page; the record renders the raw text instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Malformed '{field}' blob: {reason}")]
pub struct MalformedBlob {
    pub field: &'static str,
    pub reason: String,
}
