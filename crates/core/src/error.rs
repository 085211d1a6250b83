//! Engine error model.

use thiserror::Error;

/// Result type used across the workflow engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Workflow-engine error.
///
/// Keep this focused on deterministic workflow failures (illegal edges,
/// missing reasons, validation) plus the one remote-side failure the
/// controller must translate into a rollback. Transport details belong to the
/// remote collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A status edge not present in the transition table was requested.
    ///
    /// Rejected locally, before any optimistic mutation or remote call.
    #[error("illegal transition: {0}")]
    IllegalTransition(String),

    /// A nonzero quantity difference was submitted with an empty reason.
    ///
    /// Rejected locally, before any optimistic mutation or remote call.
    #[error("reason required: {0}")]
    ReasonRequired(String),

    /// The target status has no remote action mapped to it.
    ///
    /// Returned as a typed failure (after rolling back the optimistic
    /// window), never panicked.
    #[error("unsupported transition: {0}")]
    UnsupportedTransition(String),

    /// The remote service failed (transport error or service-reported).
    ///
    /// Always paired with an exact rollback to the pre-mutation snapshot.
    #[error("remote failure: {0}")]
    RemoteFailure(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested movement was not found in the local cache.
    #[error("not found")]
    NotFound,
}

impl EngineError {
    pub fn illegal_transition(msg: impl Into<String>) -> Self {
        Self::IllegalTransition(msg.into())
    }

    pub fn reason_required(msg: impl Into<String>) -> Self {
        Self::ReasonRequired(msg.into())
    }

    pub fn unsupported_transition(msg: impl Into<String>) -> Self {
        Self::UnsupportedTransition(msg.into())
    }

    pub fn remote_failure(msg: impl Into<String>) -> Self {
        Self::RemoteFailure(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
