//! In-memory peer directory
//!
//! Holds peer records and publishes every change to subscribers over a
//! broadcast channel. Consumers that cache per-peer state (buckets, clients)
//! subscribe explicitly; nothing is notified through globals.

use crate::{services::PeerDirectory, types::PeerInfo, Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Capacity of the change-notification channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change to the peer set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// Peer added
    Added(PeerInfo),
    /// Peer replaced
    Updated(PeerInfo),
    /// Peer removed
    Removed(String),
}

/// Peer directory backed by a hash map
#[derive(Debug)]
pub struct MemoryPeerDirectory {
    peers: RwLock<HashMap<String, PeerInfo>>,
    events: broadcast::Sender<PeerEvent>,
}

impl MemoryPeerDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            peers: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to peer changes
    pub fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.events.subscribe()
    }

    /// Add a peer, replacing any record with the same ID
    pub fn add(&self, info: PeerInfo) -> PeerInfo {
        self.peers.write().insert(info.id.clone(), info.clone());
        tracing::debug!(peer_id = %info.id, "added peer");
        self.publish(PeerEvent::Added(info.clone()));
        info
    }

    /// Replace an existing peer
    pub fn update(&self, info: PeerInfo) -> Result<PeerInfo> {
        {
            let mut peers = self.peers.write();
            let existing = peers
                .get_mut(&info.id)
                .ok_or_else(|| Error::PeerNotFound(info.id.clone()))?;
            *existing = info.clone();
        }
        tracing::debug!(peer_id = %info.id, "updated peer");
        self.publish(PeerEvent::Updated(info.clone()));
        Ok(info)
    }

    /// Remove a peer
    pub fn remove(&self, peer_id: &str) -> Result<()> {
        self.peers
            .write()
            .remove(peer_id)
            .ok_or_else(|| Error::PeerNotFound(peer_id.to_string()))?;
        tracing::debug!(peer_id = %peer_id, "removed peer");
        self.publish(PeerEvent::Removed(peer_id.to_string()));
        Ok(())
    }

    /// All peers, ordered by ID
    pub fn list(&self) -> Vec<PeerInfo> {
        let mut peers: Vec<PeerInfo> = self.peers.read().values().cloned().collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }

    fn publish(&self, event: PeerEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

impl Default for MemoryPeerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerDirectory for MemoryPeerDirectory {
    async fn get(&self, id: &str) -> Result<PeerInfo> {
        self.peers
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PeerNotFound(id.to_string()))
    }
}
