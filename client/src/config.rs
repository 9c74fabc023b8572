//! Client configuration, TOML-backed with defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address as `host:port`.
    pub server_addr: String,

    /// Enables client-side response memoization: identical resends of a
    /// request are answered from cache without a network round trip.
    pub at_most_once: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:55555".to_owned(),
            at_most_once: false,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|err| ClientError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server_addr, "127.0.0.1:55555");
        assert!(!config.at_most_once);
    }

    #[test]
    fn parses_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            server_addr = "10.0.0.5:56000"
            at_most_once = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server_addr, "10.0.0.5:56000");
        assert!(config.at_most_once);
    }
}
