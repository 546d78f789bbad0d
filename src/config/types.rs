// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LANDING_PAGE: &str = "test.html";
pub const DEFAULT_ROOT: &str = ".";
/// Connections are not time-limited unless configured
pub const DEFAULT_CONNECTION_TIMEOUT: u64 = 0;
pub const DEFAULT_ACCESS_LOG_FORMAT: &str = "common";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Page advertised in the startup banner
    pub landing_page: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: None,
            landing_page: DEFAULT_LANDING_PAGE.to_string(),
        }
    }
}

/// File serving configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Directory served at `/`
    pub root: PathBuf,
    pub index_files: Vec<String>,
    pub keep_alive: bool,
    /// Upper bound on a single connection's lifetime, in seconds; 0 disables it
    pub connection_timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            index_files: default_index_files(),
            keep_alive: true,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

pub fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (common, combined, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            access_log_format: DEFAULT_ACCESS_LOG_FORMAT.to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}
