//! Directory configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFINDER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFINDER_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `STOREFINDER_OPERATION_TIMEOUT_SECS` - Per-operation timeout (default: 10)
//! - `STOREFINDER_PAGE_SIZE` - Stores per listing page (default: 4)
//! - `STOREFINDER_NEAR_RADIUS_METERS` - Proximity search radius (default: 10000)

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PAGE_SIZE: u32 = 4;
const DEFAULT_NEAR_RADIUS_METERS: f64 = 10_000.0;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Tunables the services read on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Stores per page of the paginated listing.
    pub page_size: u32,
    /// Radius of the proximity search.
    pub near_radius_meters: f64,
    /// Upper bound on a single service operation.
    pub operation_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            near_radius_meters: DEFAULT_NEAR_RADIUS_METERS,
            operation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Directory configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct DirectoryConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Service tunables
    pub settings: Settings,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("settings", &self.settings)
            .finish()
    }
}

impl DirectoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings only, for runs without a database.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a numeric setting does not parse.
    pub fn settings_from_env() -> Result<Settings, ConfigError> {
        let _ = dotenvy::dotenv();
        settings_from_lookup(&|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("STOREFINDER_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFINDER_DATABASE_URL".to_string()))?;

        let max_connections = parse_or_default(
            &lookup,
            "STOREFINDER_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(invalid("STOREFINDER_MAX_CONNECTIONS", "must be at least 1"));
        }

        Ok(Self {
            database_url,
            max_connections,
            settings: settings_from_lookup(&lookup)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn settings_from_lookup(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let page_size = parse_or_default(lookup, "STOREFINDER_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
    if page_size == 0 {
        return Err(invalid("STOREFINDER_PAGE_SIZE", "must be at least 1"));
    }

    let timeout_secs = parse_or_default(
        lookup,
        "STOREFINDER_OPERATION_TIMEOUT_SECS",
        DEFAULT_TIMEOUT_SECS,
    )?;
    if timeout_secs == 0 {
        return Err(invalid(
            "STOREFINDER_OPERATION_TIMEOUT_SECS",
            "must be at least 1",
        ));
    }

    let near_radius_meters = parse_or_default(
        lookup,
        "STOREFINDER_NEAR_RADIUS_METERS",
        DEFAULT_NEAR_RADIUS_METERS,
    )?;
    if !near_radius_meters.is_finite() || near_radius_meters <= 0.0 {
        return Err(invalid(
            "STOREFINDER_NEAR_RADIUS_METERS",
            "must be a positive number",
        ));
    }

    Ok(Settings {
        page_size,
        near_radius_meters,
        operation_timeout: Duration::from_secs(timeout_secs),
    })
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| invalid(key, &e.to_string()))
    })
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            DirectoryConfig::from_lookup(env(&[("STOREFINDER_DATABASE_URL", "postgres://x")]))
                .unwrap();

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.settings.page_size, 4);
        assert!((config.settings.near_radius_meters - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(config.settings.operation_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_database_url_fallback() {
        let config =
            DirectoryConfig::from_lookup(env(&[("DATABASE_URL", "postgres://fallback")])).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback");
    }

    #[test]
    fn test_primary_database_url_wins() {
        let config = DirectoryConfig::from_lookup(env(&[
            ("STOREFINDER_DATABASE_URL", "postgres://primary"),
            ("DATABASE_URL", "postgres://fallback"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary");
    }

    #[test]
    fn test_missing_database_url() {
        let err = DirectoryConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "STOREFINDER_DATABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = DirectoryConfig::from_lookup(env(&[
            ("STOREFINDER_DATABASE_URL", "postgres://x"),
            ("STOREFINDER_MAX_CONNECTIONS", "3"),
            ("STOREFINDER_PAGE_SIZE", " 12 "),
            ("STOREFINDER_OPERATION_TIMEOUT_SECS", "2"),
            ("STOREFINDER_NEAR_RADIUS_METERS", "2500.5"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 3);
        assert_eq!(config.settings.page_size, 12);
        assert_eq!(config.settings.operation_timeout, Duration::from_secs(2));
        assert!((config.settings.near_radius_meters - 2500.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_numbers() {
        let err = DirectoryConfig::from_lookup(env(&[
            ("STOREFINDER_DATABASE_URL", "postgres://x"),
            ("STOREFINDER_PAGE_SIZE", "four"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFINDER_PAGE_SIZE"));

        let err = DirectoryConfig::from_lookup(env(&[
            ("STOREFINDER_DATABASE_URL", "postgres://x"),
            ("STOREFINDER_PAGE_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = DirectoryConfig::from_lookup(env(&[
            ("STOREFINDER_DATABASE_URL", "postgres://x"),
            ("STOREFINDER_NEAR_RADIUS_METERS", "-5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = DirectoryConfig::from_lookup(env(&[(
            "STOREFINDER_DATABASE_URL",
            "postgres://user:hunter2@db/storefinder",
        )]))
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
