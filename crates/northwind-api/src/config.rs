//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Runtime settings for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PostgreSQL` connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Interface to bind (`HOST`).
    pub host: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Upper bound on pooled connections (`DATABASE_MAX_CONNECTIONS`).
    pub max_connections: u32,
    /// Apply pending migrations at startup (`RUN_MIGRATIONS`).
    pub run_migrations: bool,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is unset or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or blank, or
    /// if a numeric or boolean value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".to_owned())
            })?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_owned(),
            ));
        }
        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(value) => parse_flag(&value)?,
            None => true,
        };

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            run_migrations,
        })
    }

    /// The socket address the server binds to.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(AppError::Config(format!(
            "RUN_MIGRATIONS must be true or false, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/northwind")]).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/northwind");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_connections, 10);
        assert!(config.run_migrations);
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/northwind"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_connections, 4);
        assert!(!config.run_migrations);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_missing_database_url_is_rejected() {
        assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
        assert!(matches!(
            config_from(&[("DATABASE_URL", "  ")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let url = ("DATABASE_URL", "postgres://localhost/northwind");

        assert!(config_from(&[url, ("PORT", "http")]).is_err());
        assert!(config_from(&[url, ("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
        assert!(config_from(&[url, ("RUN_MIGRATIONS", "sometimes")]).is_err());
    }

    #[test]
    fn test_bad_host_fails_at_bind_addr() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/northwind"),
            ("HOST", "not a host"),
        ])
        .unwrap();

        assert!(matches!(config.bind_addr(), Err(AppError::Config(_))));
    }
}
