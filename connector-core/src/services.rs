//! Collaborator interfaces consumed by the pipeline

use crate::{
    types::{PeerInfo, Prepare, Reply},
    Result,
};
use async_trait::async_trait;
use settlement::SettlementEngine;
use std::fmt;
use std::sync::Arc;

/// Peer ID under which the router registers this node's own addresses
pub const SELF_PEER_ID: &str = "self";

/// Address lookup
pub trait Router: Send + Sync {
    /// Addresses a peer is known by, in preference order (may be empty)
    fn get_addresses(&self, peer_id: &str) -> Vec<String>;

    /// Peer ID of the next hop toward `destination`
    fn next_hop(&self, destination: &str) -> Option<String>;
}

/// Read access to peer configuration
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Load a peer, failing with `PeerNotFound` for unknown IDs
    async fn get(&self, id: &str) -> Result<PeerInfo>;
}

/// Transport that delivers a prepare to a peer and awaits its reply
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Send `prepare` to `peer`
    async fn send(&self, peer: &PeerInfo, prepare: &Prepare) -> Result<Reply>;
}

/// Binary packet codec
pub trait PacketCodec: Send + Sync {
    /// Decode a prepare packet
    fn parse_prepare(&self, bytes: &[u8]) -> Result<Prepare>;

    /// Encode a reply packet
    fn serialize_reply(&self, reply: &Reply) -> Result<Vec<u8>>;
}

/// Shared services handed to every request
#[derive(Clone)]
pub struct Services {
    /// Address lookup
    pub router: Arc<dyn Router>,

    /// Peer configuration
    pub peers: Arc<dyn PeerDirectory>,

    /// Outbound transport
    pub forwarder: Arc<dyn Forwarder>,

    /// Balance ledger
    pub settlement: Arc<SettlementEngine>,
}

impl Services {
    /// First address this node is known by, or `"peer"` when none is registered
    pub fn self_address(&self) -> String {
        self.router
            .get_addresses(SELF_PEER_ID)
            .into_iter()
            .next()
            .unwrap_or_else(|| "peer".to_string())
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("self_address", &self.self_address())
            .field("settlement", &self.settlement)
            .finish_non_exhaustive()
    }
}
