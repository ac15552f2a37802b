//! Static router
//!
//! Address registry plus a prefix routing table. Next-hop selection is a
//! plain longest-prefix lookup; route computation is somebody else's job.

use crate::services::Router;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Router with manually maintained tables
#[derive(Debug, Default)]
pub struct StaticRouter {
    /// Peer ID → addresses
    addresses: RwLock<HashMap<String, Vec<String>>>,

    /// Address prefix → next-hop peer ID
    routes: RwLock<BTreeMap<String, String>>,
}

impl StaticRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the addresses a peer is known by
    pub fn set_addresses(&self, peer_id: impl Into<String>, addresses: Vec<String>) {
        self.addresses.write().insert(peer_id.into(), addresses);
    }

    /// Route every destination starting with `prefix` to `peer_id`
    pub fn add_route(&self, prefix: impl Into<String>, peer_id: impl Into<String>) {
        self.routes.write().insert(prefix.into(), peer_id.into());
    }

    /// Drop a route
    pub fn remove_route(&self, prefix: &str) -> Option<String> {
        self.routes.write().remove(prefix)
    }
}

impl Router for StaticRouter {
    fn get_addresses(&self, peer_id: &str) -> Vec<String> {
        self.addresses
            .read()
            .get(peer_id)
            .cloned()
            .unwrap_or_default()
    }

    fn next_hop(&self, destination: &str) -> Option<String> {
        self.routes
            .read()
            .iter()
            .filter(|(prefix, _)| destination.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, peer_id)| peer_id.clone())
    }
}
