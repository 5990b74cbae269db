//! Reconciliation error types

use crate::kind::ResourceKind;
use thiserror::Error;

/// Errors surfaced by the reconciliation core
#[derive(Error, Debug)]
pub enum LroError {
    /// No readiness predicate registered for the kind. Wiring defect, never retried.
    #[error("No readiness predicate registered for resource kind: {0}")]
    UnknownKind(ResourceKind),

    #[error("Unknown resource kind name: {0}")]
    UnknownKindName(String),

    #[error("Malformed operation handle: {0}")]
    MalformedHandle(String),

    /// A transaction was used after it reached a terminal state.
    #[error("Invalid transaction state: {0}")]
    InvalidState(String),

    /// The remote system reported that the operation will never succeed.
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error(
        "Timed out waiting for {0}; the operation may still be completing server-side, \
         check the resource before retrying"
    )]
    TimedOut(String),

    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Cancelled before {0} could be committed")]
    Cancelled(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LroError {
    /// Whether the error indicates a defect in the calling code rather than a remote condition
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            LroError::UnknownKind(_)
                | LroError::UnknownKindName(_)
                | LroError::MalformedHandle(_)
                | LroError::InvalidState(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LroError>;
