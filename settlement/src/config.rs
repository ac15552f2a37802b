//! Configuration for settlement engine

use serde::{Deserialize, Serialize};

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Balances seeded when the engine starts
    #[serde(default)]
    pub balances: Vec<BalanceConfig>,
}

fn default_service_name() -> String {
    "settlement-engine".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            balances: Vec::new(),
        }
    }
}

/// Initial balance and bounds for one peer
///
/// TOML integers are 64-bit, so seeded values are `i64` and widened on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceConfig {
    /// Peer ID
    pub peer_id: String,

    /// Starting balance
    #[serde(default)]
    pub balance: i64,

    /// Lower bound
    #[serde(default)]
    pub minimum: i64,

    /// Upper bound
    pub maximum: i64,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject seeded balances whose bounds are inverted
    pub fn validate(&self) -> crate::Result<()> {
        for entry in &self.balances {
            if entry.minimum > entry.maximum {
                return Err(crate::Error::Config(format!(
                    "minimum {} exceeds maximum {} for peer {}",
                    entry.minimum, entry.maximum, entry.peer_id
                )));
            }
        }
        Ok(())
    }
}
