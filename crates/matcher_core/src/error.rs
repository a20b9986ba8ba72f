//! crates/matcher_core/src/error.rs
//!
//! The error taxonomy of the matching core. None of these are fatal: each is
//! reported at the boundary and the operator can recover.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Malformed session code or missing/unusable creation inputs.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A well-formed session code that is neither in memory nor in durable storage.
    #[error("No session found for code {0}")]
    NotFound(String),

    /// The candidate search failed or came back empty.
    #[error("Candidate search failed: {0}")]
    Provider(String),

    /// Durable storage could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl MatchError {
    /// Wraps a storage port failure.
    pub fn persistence(err: PortError) -> Self {
        MatchError::Persistence(err.to_string())
    }

    /// Wraps a candidate provider port failure.
    pub fn provider(err: PortError) -> Self {
        MatchError::Provider(err.to_string())
    }
}

pub type MatchResult<T> = Result<T, MatchError>;
