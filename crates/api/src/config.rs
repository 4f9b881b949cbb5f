use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;

/// Log output format, selected with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid CORS origin {0:?}")]
    CorsOrigin(String),
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `10`).
    pub shutdown_timeout_secs: u64,
    /// Postgres URL. Without it the in-memory document store is used.
    pub database_url: Option<String>,
    /// Base URL of the country directory API.
    pub countries_api_url: String,
    /// Timeout for outbound HTTP calls (default: `10`).
    pub outbound_timeout_secs: u64,
    /// Delay between database reconnect attempts (default: `60`).
    pub db_reconnect_interval_secs: u64,
    /// Cached responses older than this are not served (default: 4 hours).
    pub cache_max_age_secs: u64,
    /// Maximum number of concurrently running background tasks.
    pub background_task_limit: usize,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            cors_origins: vec!["http://localhost:8080".into()],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 10,
            database_url: None,
            countries_api_url: "https://restcountries.com/v3.1".into(),
            outbound_timeout_secs: 10,
            db_reconnect_interval_secs: 60,
            cache_max_age_secs: 4 * 60 * 60,
            background_task_limit: 64,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                          |
    /// |------------------------------|----------------------------------|
    /// | `HOST`                       | `0.0.0.0`                        |
    /// | `PORT`                       | `8080`                           |
    /// | `CORS_ORIGINS`               | `http://localhost:8080`          |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                             |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `10`                             |
    /// | `DATABASE_URL`               | unset (in-memory store)          |
    /// | `COUNTRIES_API_URL`          | `https://restcountries.com/v3.1` |
    /// | `OUTBOUND_TIMEOUT_SECS`      | `10`                             |
    /// | `DB_RECONNECT_INTERVAL_SECS` | `60`                             |
    /// | `CACHE_MAX_AGE_SECS`         | `14400`                          |
    /// | `BACKGROUND_TASK_LIMIT`      | `64`                             |
    /// | `LOG_FORMAT`                 | `pretty` (or `json`)             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cors_origins = match var("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| o.parse::<HeaderValue>().is_err())
        {
            return Err(ConfigError::CorsOrigin(bad.clone()));
        }

        let log_format = match var("LOG_FORMAT").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "log format (pretty or json)",
                })
            }
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse(&var, "PORT", "u16", defaults.port)?,
            cors_origins,
            request_timeout_secs: parse(
                &var,
                "REQUEST_TIMEOUT_SECS",
                "u64",
                defaults.request_timeout_secs,
            )?,
            shutdown_timeout_secs: parse(
                &var,
                "SHUTDOWN_TIMEOUT_SECS",
                "u64",
                defaults.shutdown_timeout_secs,
            )?,
            database_url: var("DATABASE_URL"),
            countries_api_url: var("COUNTRIES_API_URL").unwrap_or(defaults.countries_api_url),
            outbound_timeout_secs: parse(
                &var,
                "OUTBOUND_TIMEOUT_SECS",
                "u64",
                defaults.outbound_timeout_secs,
            )?,
            db_reconnect_interval_secs: parse(
                &var,
                "DB_RECONNECT_INTERVAL_SECS",
                "u64",
                defaults.db_reconnect_interval_secs,
            )?,
            cache_max_age_secs: parse(
                &var,
                "CACHE_MAX_AGE_SECS",
                "u64",
                defaults.cache_max_age_secs,
            )?,
            background_task_limit: parse(
                &var,
                "BACKGROUND_TASK_LIMIT",
                "usize",
                defaults.background_task_limit,
            )?,
            log_format,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    pub fn db_reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.db_reconnect_interval_secs)
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }
}

fn parse<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value,
            expected,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, None);
        assert_eq!(config.cache_max_age(), Duration::from_secs(14_400));
        assert_eq!(config.db_reconnect_interval(), Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = load(&[
            ("PORT", "9000"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("DATABASE_URL", "postgres://localhost/energy"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/energy")
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_number_is_rejected() {
        assert_matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        );
    }

    #[test]
    fn invalid_log_format_is_rejected() {
        assert_matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { key: "LOG_FORMAT", .. })
        );
    }
}
