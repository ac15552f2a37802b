//! Configuration for the connector

use crate::{
    peers::MemoryPeerDirectory,
    router::StaticRouter,
    services::{Forwarder, Services, SELF_PEER_ID},
    types::PeerInfo,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use settlement::SettlementEngine;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Addresses this node is known by; the first is stamped on rejects
    #[serde(default)]
    pub self_addresses: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directly connected peers
    #[serde(default)]
    pub peers: Vec<PeerInfo>,

    /// Address prefix → next-hop peer ID
    #[serde(default)]
    pub routes: BTreeMap<String, String>,

    /// Balance ledger configuration
    #[serde(default)]
    pub settlement: settlement::Config,
}

fn default_service_name() -> String {
    "connector".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            self_addresses: Vec::new(),
            logging: LoggingConfig::default(),
            peers: Vec::new(),
            routes: BTreeMap::new(),
            settlement: settlement::Config::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of plain text
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(address) = lookup("CONNECTOR_SELF_ADDRESS") {
            self.self_addresses = vec![address];
        }

        if let Some(filter) = lookup("CONNECTOR_LOG_FILTER") {
            self.logging.filter = filter;
        }

        if let Some(json) = lookup("CONNECTOR_LOG_JSON") {
            self.logging.json = json.parse().map_err(|_| {
                Error::Config(format!("CONNECTOR_LOG_JSON must be true or false, got {}", json))
            })?;
        }

        Ok(())
    }

    /// Check cross references between sections
    pub fn validate(&self) -> Result<()> {
        self.settlement.validate()?;

        for (prefix, peer_id) in &self.routes {
            if !self.peers.iter().any(|peer| &peer.id == peer_id) {
                return Err(Error::Config(format!(
                    "route {} points at unknown peer {}",
                    prefix, peer_id
                )));
            }
        }

        Ok(())
    }

    /// Assemble the peer directory, router and ledger described by this config
    pub fn build_services(&self, forwarder: Arc<dyn Forwarder>) -> Result<Services> {
        self.validate()?;

        let peers = Arc::new(MemoryPeerDirectory::new());
        for peer in &self.peers {
            peers.add(peer.clone());
        }

        let router = Arc::new(StaticRouter::new());
        router.set_addresses(SELF_PEER_ID, self.self_addresses.clone());
        for (prefix, peer_id) in &self.routes {
            router.add_route(prefix.clone(), peer_id.clone());
        }

        let settlement = Arc::new(SettlementEngine::new(self.settlement.clone()));

        tracing::info!(
            service = %self.service_name,
            peers = self.peers.len(),
            routes = self.routes.len(),
            "services assembled"
        );

        Ok(Services {
            router,
            peers,
            forwarder,
            settlement,
        })
    }
}
