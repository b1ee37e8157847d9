//! # Engine Error Taxonomy
//!
//! Every engine in the workspace fails through this one enum. Each variant
//! carries a human-readable reason; callers get a typed failure and decide
//! themselves whether to retry. An error always means the whole call was
//! rejected - no partial state mutation survives a failure.

use thiserror::Error;

/// Errors that can abort an engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A role or feature check failed for the calling address.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced token, plot, or operator does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A zero address, self-reference, out-of-range bit window, or other
    /// malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A duplicate token id or duplicate operator registration.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// An operation that conflicts with current state: a consumed nonce,
    /// a locked token, a no-progress update, a double release.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// A multisig request or time-boxed window past its bound.
    #[error("expired: {0}")]
    Expired(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
