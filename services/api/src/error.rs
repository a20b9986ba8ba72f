//! services/api/src/error.rs
//!
//! Defines the primary error type for the matcher API service.

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn startup_step() -> Result<(), ApiError> {
        Err::<(), _>(sqlx::Error::PoolTimedOut)?;
        Ok(())
    }

    #[test]
    fn storage_failures_convert_with_question_mark() {
        assert!(matches!(startup_step(), Err(ApiError::Database(_))));
        let err = ApiError::from(sqlx::migrate::MigrateError::VersionMissing(1));
        assert!(err.to_string().starts_with("Migration Error"));
    }
}
