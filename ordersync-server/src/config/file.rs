//! TOML file configuration structures.
//!
//! These structs directly map to the `ordersync.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Watcher pool configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Number of reconciliation workers. Clamped to at least one.
    #[serde(default = "default_handlers")]
    pub handlers: usize,
    /// Buffer size of the ingest event channel.
    #[serde(default = "default_ingest_buffer")]
    pub ingest_buffer: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            handlers: default_handlers(),
            ingest_buffer: default_ingest_buffer(),
        }
    }
}

fn default_handlers() -> usize {
    1
}

fn default_ingest_buffer() -> usize {
    ordersync_core::events::DEFAULT_CHANNEL_BUFFER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[watcher]
handlers = 4
ingest_buffer = 64
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.watcher.handlers, 4);
        assert_eq!(config.watcher.ingest_buffer, 64);
    }

    #[test]
    fn test_defaults_apply_for_missing_sections() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.watcher.handlers, 1);
        assert_eq!(
            config.watcher.ingest_buffer,
            ordersync_core::events::DEFAULT_CHANNEL_BUFFER
        );
    }
}
