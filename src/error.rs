//! Error handling module
//!
//! Centralized error type and its mapping to process exit codes.

use std::process::ExitCode;

use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Database schema incomplete, run `bootstrap` first")]
    SchemaIncomplete,
}

impl AppError {
    /// Constraint violations are reported, everything else aborts the run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::Store(err) if err.is_constraint_violation())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Store(StoreError::ConnectionFailure(_)) => 2,
            AppError::Store(StoreError::PipelineFailure(_)) => 3,
            AppError::Store(StoreError::ConstraintViolation { .. }) => 4,
            AppError::SchemaIncomplete => 5,
            AppError::Config(_) => 78,
            _ => 1,
        }
    }

    /// Log the error and turn it into the process exit status
    pub fn report(&self) -> ExitCode {
        match self {
            conflict if !conflict.is_fatal() => {
                tracing::warn!(error = %conflict, "Run stopped on a conflicting record");
            }
            AppError::Store(StoreError::ConnectionFailure(source)) => {
                tracing::error!(error = ?source, "Storage unreachable, aborting");
            }
            AppError::Store(StoreError::PipelineFailure(msg)) => {
                tracing::error!(error = %msg, "Stats pipeline failed, video_stats left unchanged");
            }
            other => tracing::error!(error = %other, "Run failed"),
        }
        ExitCode::from(self.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_exit_codes() {
        let err = AppError::from(StoreError::from(sqlx::Error::PoolTimedOut));
        assert_eq!(err.exit_code(), 2);
        assert!(err.is_fatal());

        let err = AppError::from(StoreError::PipelineFailure("bad stage".to_string()));
        assert_eq!(err.exit_code(), 3);

        let err = AppError::from(StoreError::ConstraintViolation {
            collection: "videos".to_string(),
            detail: "duplicate".to_string(),
        });
        assert_eq!(err.exit_code(), 4);
        assert!(!err.is_fatal());

        let err = AppError::from(ConfigError::MissingEnv("DATABASE_URL"));
        assert_eq!(err.exit_code(), 78);
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing environment variable: DATABASE_URL"
        );
    }

    #[test]
    fn test_report_returns_exit_code() {
        let conflict = AppError::from(StoreError::ConstraintViolation {
            collection: "pg_roles".to_string(),
            detail: "role exists".to_string(),
        });
        assert_eq!(conflict.report(), ExitCode::from(4));

        let missing = AppError::SchemaIncomplete;
        assert!(missing.is_fatal());
        assert_eq!(missing.report(), ExitCode::from(5));
    }

    #[test]
    fn test_store_errors_are_transparent() {
        let err = AppError::from(StoreError::PipelineFailure("bad stage".to_string()));
        assert_eq!(err.to_string(), "Stats pipeline failed: bad stage");
    }
}
