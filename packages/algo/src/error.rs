//! Engine error taxonomy.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Caller-recoverable bad input, such as a blank word token.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The addressed word or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A computed state broke a progress-record invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
