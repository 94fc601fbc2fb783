//! CLI configuration loading from file and environment variables.

use libris_db::DbRuntimeSettings;
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Whether the values came from a file rather than built-in defaults.
    /// Set by the loader; tracing is not up yet while loading, so the caller
    /// reports it.
    #[serde(skip)]
    pub file_found: bool,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "warn", "libris_catalog=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_db_path() -> String {
    "library.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    DbRuntimeSettings::default().pool_max_size
}

// Logs share the terminal with the menu, so only warnings show by default.
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// Returns the pool settings described by this section.
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist ([`Config::file_found`] is then `false`).
///
/// Environment variable overrides:
/// - `LIBRIS_DB_PATH` overrides `database.path`
/// - `LIBRIS_DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `LIBRIS_LOG_LEVEL` overrides `logging.level`
/// - `LIBRIS_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`], reading overrides through `env`.
pub fn load_config_with_env<F>(path: Option<&str>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => Config {
                file_found: true,
                ..toml::from_str::<Config>(&contents)?
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(db_path) = env("LIBRIS_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(timeout) = env("LIBRIS_DB_BUSY_TIMEOUT_MS") {
        if let Ok(parsed) = timeout.parse() {
            config.database.busy_timeout_ms = parsed;
        }
    }
    if let Some(level) = env("LIBRIS_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("LIBRIS_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_file() {
        let config = load_config_with_env(None, no_env).expect("defaults should load");
        assert_eq!(config.database.path, "library.db");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.database.pool_max_size, 1);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");
        let config = load_config_with_env(path.to_str(), no_env).expect("should fall back");
        assert_eq!(config.database.path, "library.db");
        assert!(!config.file_found);
    }

    #[test]
    fn file_found_is_reported_only_for_a_read_file() {
        let config = load_config_with_env(None, no_env).expect("defaults should load");
        assert!(!config.file_found);

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[logging]\nlevel = \"info\"").expect("write config");
        let config =
            load_config_with_env(file.path().to_str(), no_env).expect("config should parse");
        assert!(config.file_found);
        assert_eq!(config.logging.level, "info");

        let config = load_config_with_env(file.path().to_str(), |key| {
            (key == "LIBRIS_LOG_LEVEL").then(|| "debug".to_string())
        })
        .expect("config should load");
        assert!(config.file_found, "env overrides keep the file marker");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parses_partial_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[database]\npath = \"/var/lib/libris/catalog.db\"\n\n[logging]\njson = true"
        )
        .expect("write config");

        let config =
            load_config_with_env(file.path().to_str(), no_env).expect("config should parse");
        assert_eq!(config.database.path, "/var/lib/libris/catalog.db");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[database\npath = 3").expect("write config");

        let err = load_config_with_env(file.path().to_str(), no_env)
            .expect_err("malformed toml should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("LIBRIS_DB_PATH", "override.db"),
            ("LIBRIS_DB_BUSY_TIMEOUT_MS", "250"),
            ("LIBRIS_LOG_LEVEL", "debug"),
            ("LIBRIS_LOG_JSON", "1"),
        ]);
        let config = load_config_with_env(None, |key| env.get(key).map(|v| v.to_string()))
            .expect("config should load");

        assert_eq!(config.database.path, "override.db");
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(
            config.database.runtime_settings(),
            DbRuntimeSettings {
                busy_timeout_ms: 250,
                pool_max_size: 1,
            }
        );
    }

    #[test]
    fn unparsable_timeout_override_is_ignored() {
        let config = load_config_with_env(None, |key| {
            (key == "LIBRIS_DB_BUSY_TIMEOUT_MS").then(|| "soon".to_string())
        })
        .expect("config should load");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
    }
}
