// Server and client configuration.
//
// Both structs have working defaults and can be loaded from a JSON file;
// fields missing from the file keep their defaults. The binaries layer
// command-line flags on top.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default listen port for the server and the client.
pub const DEFAULT_PORT: u16 = 8007;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    /// 0 lets the OS pick a free port.
    pub port: u16,
    /// Evict a player who has waited this long without an opponent. `None`
    /// waits forever.
    pub pending_timeout_ms: Option<u64>,
    /// How often the accept loop checks for shutdown and stale players.
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            pending_timeout_ms: None,
            poll_interval_ms: 50,
        }
    }
}

impl ServerConfig {
    pub fn pending_timeout(&self) -> Option<Duration> {
        self.pending_timeout_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port` of the match relay server.
    pub server_addr: String,
    pub connect_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{DEFAULT_PORT}"),
            connect_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

/// Load a config struct from a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_server_config_keeps_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 9000, "pending_timeout_ms": 30000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.pending_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.bind_addr, ServerConfig::default().bind_addr);
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn client_config_from_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"server_addr": "checkers.example:8007"}"#).unwrap();
        assert_eq!(config.server_addr, "checkers.example:8007");
        assert_eq!(config.connect_timeout(), None);
        assert_eq!(ClientConfig::default().server_addr, "127.0.0.1:8007");
    }

    #[test]
    fn load_json_reports_missing_and_malformed_files() {
        let dir = std::env::temp_dir();
        let missing = dir.join("net_checkers_config_does_not_exist.json");
        assert!(matches!(
            load_json::<ServerConfig>(&missing),
            Err(ConfigError::Read { .. })
        ));

        let malformed = dir.join(format!("net_checkers_bad_{}.json", std::process::id()));
        fs::write(&malformed, "{ port: ").unwrap();
        assert!(matches!(
            load_json::<ServerConfig>(&malformed),
            Err(ConfigError::Parse { .. })
        ));
        let _ = fs::remove_file(&malformed);
    }
}
