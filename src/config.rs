//! Configuration module
//!
//! Loads configuration from environment variables. The application password
//! is injected at runtime, directly or through a secret file.

use std::env;

use crate::schema::{Credential, Secret};
use crate::stats::DEFAULT_TOP_LIMIT;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Login role provisioned by the bootstrapper
    pub app_user: String,

    /// Password of the login role, if one was injected
    pub app_password: Option<Secret>,

    /// Rows in the top videos report
    pub report_top_limit: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns `None` for unset keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let app_user = lookup("APP_DB_USER").unwrap_or_else(|| "streaming_app".to_string());
        if app_user.trim().is_empty() {
            return Err(ConfigError::InvalidValue("APP_DB_USER"));
        }

        let app_password = match lookup("APP_DB_PASSWORD_FILE") {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::SecretFile { path, source })?;
                Some(Secret::new(contents.trim_end_matches(['\r', '\n'])))
            }
            None => lookup("APP_DB_PASSWORD").map(Secret::new),
        }
        .filter(|secret| !secret.is_empty());

        let report_top_limit = lookup("REPORT_TOP_LIMIT")
            .map(|value| value.parse::<usize>())
            .transpose()
            .map_err(|_| ConfigError::InvalidValue("REPORT_TOP_LIMIT"))?
            .unwrap_or(DEFAULT_TOP_LIMIT);

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            app_user,
            app_password,
            report_top_limit,
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// The application credential, when a password was injected
    pub fn credential(&self) -> Option<Credential> {
        self.app_password
            .clone()
            .map(|password| Credential::new(self.app_user.clone(), password))
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Cannot read secret file {path}: {source}")]
    SecretFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/streaming_analytics")]).unwrap();

        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.app_user, "streaming_app");
        assert!(config.app_password.is_none());
        assert!(config.credential().is_none());
        assert_eq!(config.report_top_limit, 5);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_numbers() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("REPORT_TOP_LIMIT", "five"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("REPORT_TOP_LIMIT")));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("DATABASE_MAX_CONNECTIONS", "-1"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS")));
    }

    #[test]
    fn test_password_is_injected_and_redacted() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("APP_DB_USER", "analytics_rw"),
            ("APP_DB_PASSWORD", "injected-secret"),
        ])
        .unwrap();

        let credential = config.credential().unwrap();
        assert_eq!(credential.username, "analytics_rw");
        assert_eq!(credential.password.expose(), "injected-secret");
        assert!(!format!("{:?}", config).contains("injected-secret"));
    }

    #[test]
    fn test_password_file_wins() {
        let path = std::env::temp_dir().join(format!("app-db-password-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "from-file\n").unwrap();

        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("APP_DB_PASSWORD", "from-env"),
            ("APP_DB_PASSWORD_FILE", path.to_str().unwrap()),
        ])
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.app_password.unwrap().expose(), "from-file");
    }

    #[test]
    fn test_unreadable_password_file() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("APP_DB_PASSWORD_FILE", "/nonexistent/secret"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::SecretFile { .. }));
    }
}
