// Configuration module entry point
// Loads the listener and serving configuration and holds the per-server state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, ServerConfig};
use types::{
    default_index_files, DEFAULT_ACCESS_LOG_FORMAT, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_HOST,
    DEFAULT_LANDING_PAGE, DEFAULT_PORT, DEFAULT_ROOT,
};

/// Optional overlay file looked up in the working directory
pub const CONFIG_FILE: &str = "devserve";

impl Config {
    /// Load configuration from the default overlay file, if present
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from specified file path (without extension).
    /// Only the TOML overlay is read. A missing file is not an error: the
    /// built-in defaults apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::new(config_path, config::FileFormat::Toml).required(false))
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.landing_page", DEFAULT_LANDING_PAGE)?
            .set_default("http.root", DEFAULT_ROOT)?
            .set_default("http.index_files", default_index_files())?
            .set_default("http.keep_alive", true)?
            .set_default(
                "http.connection_timeout",
                i64::try_from(DEFAULT_CONNECTION_TIMEOUT).unwrap_or(i64::MAX),
            )?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", DEFAULT_ACCESS_LOG_FORMAT)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// URL printed in the startup banner for a server bound on `port`
    pub fn landing_url(&self, port: u16) -> String {
        format!(
            "http://localhost:{port}/{}",
            self.server.landing_page.trim_start_matches('/')
        )
    }
}
