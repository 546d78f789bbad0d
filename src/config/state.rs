// Application state module
// Per-server state shared by every connection task

use std::path::PathBuf;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical serving root, resolved once at startup
    pub root: PathBuf,
    pub access_log: bool,
}

impl AppState {
    /// Resolve the serving root; fails if the directory does not exist
    pub fn new(config: &Config) -> std::io::Result<Self> {
        let root = config.http.root.canonicalize()?;
        Ok(Self {
            config: config.clone(),
            root,
            access_log: config.logging.access_log,
        })
    }
}
