//! Configuration loading.
//!
//! Settings come from a TOML file plus CLI overrides; the database URL is
//! taken from the environment so credentials stay out of the config file.

mod file;

pub use file::{FileConfig, ServerConfig, WatcherConfig};

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Load the configuration file, applying the CLI listen override if given.
///
/// A missing file is not an error: every section has defaults, so the
/// service can start from CLI arguments and environment alone.
pub fn load_config(
    path: &Path,
    listen_override: Option<SocketAddr>,
) -> Result<FileConfig, ConfigError> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str::<FileConfig>(&raw)?
    } else {
        toml::from_str::<FileConfig>("")?
    };

    if let Some(listen) = listen_override {
        config.server.listen = listen;
    }

    Ok(config)
}

/// Read the database connection string from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
