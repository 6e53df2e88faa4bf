//! Application configuration loaded from environment variables.

use std::time::Duration;

const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Log output format selected with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `json` or `pretty` (default: `pretty`)
/// - `DATABASE_URL` — Postgres URL; unset keeps items in memory
/// - `DATABASE_MAX_CONNECTIONS` — pool size (default: `10`)
/// - `IDENTITY_PROJECT_ID` — identity project; unset uses an in-memory provider
/// - `IDENTITY_BASE_URL`, `IDENTITY_API_KEY`, `IDENTITY_ACCESS_TOKEN`
/// - `IDENTITY_TIMEOUT_SECS` — per-request timeout (default: `10`)
/// - `IDENTITY_DEV_TOKEN` — bearer token accepted by the in-memory provider
/// - `SHUTDOWN_TIMEOUT_SECS` — graceful drain limit (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub identity_project_id: Option<String>,
    pub identity_base_url: String,
    pub identity_api_key: Option<String>,
    pub identity_access_token: Option<String>,
    pub identity_timeout: Duration,
    pub identity_dev_token: Option<String>,
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database_url: var("DATABASE_URL"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            identity_project_id: var("IDENTITY_PROJECT_ID"),
            identity_base_url: var("IDENTITY_BASE_URL").unwrap_or(defaults.identity_base_url),
            identity_api_key: var("IDENTITY_API_KEY"),
            identity_access_token: var("IDENTITY_ACCESS_TOKEN"),
            identity_timeout: var("IDENTITY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.identity_timeout),
            identity_dev_token: var("IDENTITY_DEV_TOKEN"),
            shutdown_timeout: var("SHUTDOWN_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 10,
            identity_project_id: None,
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            identity_api_key: None,
            identity_access_token: None,
            identity_timeout: Duration::from_secs(10),
            identity_dev_token: None,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.database_url.is_none());
        assert!(config.identity_project_id.is_none());
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_empty_lookup_matches_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.identity_base_url, DEFAULT_IDENTITY_BASE_URL);
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/items"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("IDENTITY_PROJECT_ID", "demo"),
            ("IDENTITY_TIMEOUT_SECS", "3"),
            ("SHUTDOWN_TIMEOUT_SECS", "30"),
        ]);
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/items")
        );
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.identity_project_id.as_deref(), Some("demo"));
        assert_eq!(config.identity_timeout, Duration::from_secs(3));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_and_blank_values_fall_back() {
        let config = from_pairs(&[
            ("PORT", "not-a-port"),
            ("DATABASE_URL", "  "),
            ("IDENTITY_TIMEOUT_SECS", "-1"),
        ]);
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.identity_timeout, Duration::from_secs(10));
    }
}
