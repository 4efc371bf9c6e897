//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream AIS feed settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
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

    /// Maximum number of pooled SQLite connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "barents_ingest=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Upstream AIS feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// WebSocket URL of the AIS push feed.
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// aisstream.io API key. Usually supplied via `AISSTREAM_API_KEY`;
    /// the server refuses to start without one.
    #[serde(default)]
    pub api_key: String,

    /// Geographic bounding filter as `[[south, west], [north, east]]`.
    #[serde(default = "default_bounding_box")]
    pub bounding_box: [[f64; 2]; 2],
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "ships.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_upstream_url() -> String {
    barents_ingest::AISSTREAM_URL.to_string()
}

/// Northern Norway, the Barents Sea, and the Kola Peninsula.
fn default_bounding_box() -> [[f64; 2]; 2] {
    [[68.0, 14.0], [74.0, 41.0]]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
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

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            api_key: String::new(),
            bounding_box: default_bounding_box(),
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

    /// No upstream credential was supplied.
    #[error("no upstream API key configured — set AISSTREAM_API_KEY or [upstream] api_key")]
    MissingApiKey,
}

impl Config {
    /// Returns the upstream API key, or the one fatal configuration error
    /// this service has.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self.upstream.api_key.trim();
        if key.is_empty() {
            Err(ConfigError::MissingApiKey)
        } else {
            Ok(key)
        }
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `BARENTS_HOST` overrides `server.host`
/// - `BARENTS_PORT` overrides `server.port`
/// - `BARENTS_DB_PATH` overrides `database.path`
/// - `BARENTS_LOG_LEVEL` overrides `logging.level`
/// - `BARENTS_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `BARENTS_UPSTREAM_URL` overrides `upstream.url`
/// - `AISSTREAM_API_KEY` overrides `upstream.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("BARENTS_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("BARENTS_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("BARENTS_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("BARENTS_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("BARENTS_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(url) = std::env::var("BARENTS_UPSTREAM_URL") {
        config.upstream.url = url;
    }
    if let Ok(api_key) = std::env::var("AISSTREAM_API_KEY") {
        config.upstream.api_key = api_key;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_everything_except_the_api_key() {
        let config = Config::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "ships.db");
        assert_eq!(config.upstream.url, barents_ingest::AISSTREAM_URL);
        assert_eq!(config.upstream.bounding_box, [[68.0, 14.0], [74.0, 41.0]]);

        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn toml_values_parse() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [database]
            path = "/var/lib/barents/ships.db"

            [upstream]
            api_key = "secret"
            bounding_box = [[58.0, 3.0], [62.0, 12.0]]
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/var/lib/barents/ships.db");
        assert_eq!(config.require_api_key().expect("key is set"), "secret");
        assert_eq!(config.upstream.bounding_box[0], [58.0, 3.0]);
        // Unspecified sections keep their defaults.
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn whitespace_api_key_is_still_missing() {
        let mut config = Config::default();
        config.upstream.api_key = "   ".to_string();
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }
}
