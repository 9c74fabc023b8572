//! Server configuration.
//!
//! The core consumes these values; it does not own how they are produced.
//! The binary loads them from a TOML file, falling back to defaults that
//! disable every fault-injection knob.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ServerError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// UDP port the request listener binds.
    pub port: u16,

    /// Enables server-side duplicate suppression (at-most-once mode).
    pub at_most_once: bool,

    /// Fraction of inbound datagrams dropped before any processing.
    pub message_drop_rate: f64,

    /// Number of consecutive outbound responses to withhold after
    /// successful processing; 0 disables withholding.
    pub response_withhold: u32,

    /// Facility catalog seeded at startup.
    pub facilities: Vec<FacilityEntry>,
}

/// One catalog record: id, display name and the facility-type ordinal.
#[derive(Debug, Clone, Deserialize)]
pub struct FacilityEntry {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 55555,
            at_most_once: false,
            message_drop_rate: 0.0,
            response_withhold: 0,
            facilities: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|err| ServerError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_fault_injection() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 55555);
        assert!(!config.at_most_once);
        assert_eq!(config.message_drop_rate, 0.0);
        assert_eq!(config.response_withhold, 0);
    }

    #[test]
    fn parses_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            port = 56000
            at_most_once = true
            message_drop_rate = 0.25

            [[facilities]]
            id = 7
            name = "Main Hall"
            type = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 56000);
        assert!(config.at_most_once);
        assert_eq!(config.message_drop_rate, 0.25);
        assert_eq!(config.facilities.len(), 1);
        assert_eq!(config.facilities[0].kind, 2);
    }
}
