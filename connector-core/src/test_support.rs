//! Shared fixtures for unit tests

use crate::{
    context::RequestContext,
    metrics::Metrics,
    peers::MemoryPeerDirectory,
    pipeline::{Pipeline, Rule},
    router::StaticRouter,
    services::{Forwarder, PeerDirectory, Services},
    types::{Fulfill, PeerInfo, PeerRelation, Prepare, Reply},
    Error, Result,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use settlement::SettlementEngine;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Preimage used by every test prepare
pub(crate) const FULFILLMENT: [u8; 32] = [1u8; 32];

pub(crate) fn fulfill_for(fulfillment: [u8; 32]) -> Fulfill {
    Fulfill {
        fulfillment,
        data: Bytes::new(),
    }
}

/// Prepare expiring `expires_in_secs` from now
pub(crate) fn prepare(destination: &str, amount: u64, expires_in_secs: i64) -> Prepare {
    Prepare {
        destination: destination.to_string(),
        amount,
        expires_at: Utc::now() + chrono::Duration::seconds(expires_in_secs),
        execution_condition: Sha256::digest(FULFILLMENT).into(),
        data: Bytes::new(),
    }
}

/// Forwarder returning a canned reply after an optional delay
pub(crate) struct MockForwarder {
    reply: Mutex<Reply>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    last_amount: Mutex<Option<u64>>,
}

impl MockForwarder {
    fn new() -> Self {
        Self {
            reply: Mutex::new(Reply::Fulfill(fulfill_for(FULFILLMENT))),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
            last_amount: Mutex::new(None),
        }
    }

    pub(crate) fn set_reply(&self, reply: Reply) {
        *self.reply.lock() = reply;
    }

    pub(crate) fn set_failure(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_amount(&self) -> Option<u64> {
        *self.last_amount.lock()
    }
}

#[async_trait]
impl Forwarder for MockForwarder {
    async fn send(&self, _peer: &PeerInfo, prepare: &Prepare) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_amount.lock() = Some(prepare.amount);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().clone();
        match failure {
            Some(message) => Err(Error::Internal(message)),
            None => Ok(self.reply.lock().clone()),
        }
    }
}

/// Peers `alice` (child) and `bob` (peer), a route `g.bob` → bob
pub(crate) struct TestHarness {
    pub(crate) peers: Arc<MemoryPeerDirectory>,
    pub(crate) router: Arc<StaticRouter>,
    pub(crate) forwarder: Arc<MockForwarder>,
    pub(crate) settlement: Arc<SettlementEngine>,
    pub(crate) metrics: Arc<Metrics>,
}

impl TestHarness {
    pub(crate) fn new() -> Self {
        let peers = Arc::new(MemoryPeerDirectory::new());
        peers.add(PeerInfo::new("alice", PeerRelation::Child));
        peers.add(PeerInfo::new("bob", PeerRelation::Peer));

        let router = Arc::new(StaticRouter::new());
        router.add_route("g.bob", "bob");

        Self {
            peers,
            router,
            forwarder: Arc::new(MockForwarder::new()),
            settlement: Arc::new(SettlementEngine::default()),
            metrics: Arc::new(Metrics::new().unwrap()),
        }
    }

    pub(crate) fn services(&self) -> Services {
        Services {
            router: self.router.clone(),
            peers: self.peers.clone(),
            forwarder: self.forwarder.clone(),
            settlement: self.settlement.clone(),
        }
    }

    pub(crate) fn pipeline(&self, rules: Vec<Arc<dyn Rule>>) -> Pipeline {
        Pipeline::new(self.services(), rules, self.metrics.clone())
    }

    pub(crate) async fn context(&self, peer_id: &str, prepare: Prepare) -> RequestContext {
        let peer = self.peers.get(peer_id).await.unwrap();
        RequestContext::new(Uuid::new_v4(), prepare, peer, self.services())
    }
}
