//! Application credential
//!
//! The password is injected through configuration and never lives in source.

use std::fmt;

/// A secret string that never prints its value
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(\"***\")")
    }
}

/// Login role with read-write access to the analytics database
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password: Secret,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: Secret) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Statements that create the role and grant read-write scope on `database`.
    ///
    /// Role DDL cannot take bind parameters, so identifiers and the password
    /// literal are quoted here.
    pub fn provision_statements(&self, database: &str) -> Vec<String> {
        let role = quote_ident(&self.username);
        vec![
            format!(
                "CREATE ROLE {} WITH LOGIN PASSWORD {}",
                role,
                quote_literal(self.password.expose())
            ),
            format!("GRANT CONNECT ON DATABASE {} TO {}", quote_ident(database), role),
            format!("GRANT USAGE ON SCHEMA public TO {}", role),
            format!(
                "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {}",
                role
            ),
            format!("GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA public TO {}", role),
            // video_stats is recreated on every rebuild
            format!(
                "ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO {}",
                role
            ),
        ]
    }
}

/// Quote a SQL identifier
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a SQL string literal
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret(\"***\")");
        assert_eq!(secret.expose(), "hunter2");

        let credential = Credential::new("streaming_app", secret);
        assert!(!format!("{:?}", credential).contains("hunter2"));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_ident("streaming_app"), "\"streaming_app\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_provision_statements() {
        let credential = Credential::new("streaming_app", Secret::new("p'w"));
        let statements = credential.provision_statements("streaming_analytics");

        assert_eq!(
            statements[0],
            "CREATE ROLE \"streaming_app\" WITH LOGIN PASSWORD 'p''w'"
        );
        assert_eq!(
            statements[1],
            "GRANT CONNECT ON DATABASE \"streaming_analytics\" TO \"streaming_app\""
        );
        assert!(statements.iter().any(|s| s.starts_with("ALTER DEFAULT PRIVILEGES")));
    }
}
