//! Per-request state carried through the rule chain

use crate::{
    services::Services,
    types::{PeerInfo, Prepare, Reply},
    Error, Result,
};
use uuid::Uuid;

/// State of one in-flight request
///
/// Owned by exactly one request and dropped when it completes. The prepare
/// is read-only once the context exists.
#[derive(Debug)]
pub struct RequestContext {
    id: Uuid,
    prepare: Prepare,
    incoming_peer: PeerInfo,
    outgoing_peer: Option<PeerInfo>,
    outgoing_amount: u64,
    reply: Option<Reply>,
    services: Services,
}

impl RequestContext {
    /// Create context for a prepare received from `incoming_peer`
    pub fn new(id: Uuid, prepare: Prepare, incoming_peer: PeerInfo, services: Services) -> Self {
        let outgoing_amount = prepare.amount;
        Self {
            id,
            prepare,
            incoming_peer,
            outgoing_peer: None,
            outgoing_amount,
            reply: None,
            services,
        }
    }

    /// Request ID used for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The prepare as received
    pub fn prepare(&self) -> &Prepare {
        &self.prepare
    }

    /// Peer the prepare came from
    pub fn incoming_peer(&self) -> &PeerInfo {
        &self.incoming_peer
    }

    /// Next-hop peer, once the switch has resolved it
    pub fn outgoing_peer(&self) -> Result<&PeerInfo> {
        self.outgoing_peer.as_ref().ok_or_else(|| {
            Error::Internal("outgoing peer requested before the switch resolved it".to_string())
        })
    }

    /// Record the next-hop peer
    pub fn set_outgoing_peer(&mut self, peer: PeerInfo) {
        self.outgoing_peer = Some(peer);
    }

    /// Amount to send to the next hop
    pub fn outgoing_amount(&self) -> u64 {
        self.outgoing_amount
    }

    /// Override the amount sent to the next hop
    pub fn set_outgoing_amount(&mut self, amount: u64) {
        self.outgoing_amount = amount;
    }

    /// Prepare to send to the next hop
    pub fn outgoing_prepare(&self) -> Prepare {
        Prepare {
            amount: self.outgoing_amount,
            ..self.prepare.clone()
        }
    }

    /// Reply produced so far
    pub fn reply(&self) -> Option<&Reply> {
        self.reply.as_ref()
    }

    /// Fill the reply slot
    pub fn set_reply(&mut self, reply: Reply) {
        self.reply = Some(reply);
    }

    /// Move the reply out of the context
    pub fn take_reply(&mut self) -> Option<Reply> {
        self.reply.take()
    }

    /// Shared services
    pub fn services(&self) -> &Services {
        &self.services
    }
}
