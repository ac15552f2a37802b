//! Throughput rule
//!
//! Throttles the money bandwidth of each peer, separately for the incoming
//! and outgoing legs. Buckets are created the first time a peer is seen in a
//! direction, sized from that peer's `rules.throughput` configuration, and
//! kept for the lifetime of the rule. A peer without a limit for a direction
//! is never throttled in that direction.
//!
//! Tokens are spent when a packet passes the rule, not when it succeeds: a
//! packet that later fails downstream is not refunded.

use crate::{
    context::RequestContext,
    metrics::Metrics,
    pipeline::{Next, Rule},
    token_bucket::TokenBucket,
    types::{Direction, PeerInfo},
    Error, Result,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-peer, per-direction money bandwidth limiter
#[derive(Debug)]
pub struct ThroughputRule {
    incoming_buckets: DashMap<String, Arc<TokenBucket>>,
    outgoing_buckets: DashMap<String, Arc<TokenBucket>>,
    metrics: Arc<Metrics>,
}

impl ThroughputRule {
    /// Create the rule with empty bucket maps
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            incoming_buckets: DashMap::new(),
            outgoing_buckets: DashMap::new(),
            metrics,
        }
    }

    /// Tokens left in the incoming bucket of a peer, if one exists
    pub fn incoming_bucket_available(&self, peer_id: &str) -> Option<u64> {
        self.incoming_buckets
            .get(peer_id)
            .map(|bucket| bucket.available())
    }

    /// Tokens left in the outgoing bucket of a peer, if one exists
    pub fn outgoing_bucket_available(&self, peer_id: &str) -> Option<u64> {
        self.outgoing_buckets
            .get(peer_id)
            .map(|bucket| bucket.available())
    }

    fn buckets(&self, direction: Direction) -> &DashMap<String, Arc<TokenBucket>> {
        match direction {
            Direction::Incoming => &self.incoming_buckets,
            Direction::Outgoing => &self.outgoing_buckets,
        }
    }

    /// Existing bucket for the peer, or a new one if the peer has a limit
    fn bucket_for(&self, direction: Direction, peer: &PeerInfo) -> Option<Arc<TokenBucket>> {
        let buckets = self.buckets(direction);
        if let Some(bucket) = buckets.get(&peer.id) {
            return Some(bucket.clone());
        }

        let bucket = create_bucket_for_peer(peer, direction)?;

        // Concurrent first packets race here; entry() keeps exactly one bucket
        let bucket = buckets
            .entry(peer.id.clone())
            .or_insert_with(|| {
                tracing::debug!(
                    peer_id = %peer.id,
                    %direction,
                    capacity = bucket.capacity(),
                    refill_period_ms = bucket.refill_period().as_millis() as u64,
                    "created throughput bucket"
                );
                Arc::new(bucket)
            })
            .clone();
        Some(bucket)
    }

    fn check(&self, direction: Direction, peer: &PeerInfo, amount: u64) -> Result<()> {
        let bucket = match self.bucket_for(direction, peer) {
            Some(bucket) => bucket,
            None => return Ok(()),
        };

        if bucket.take(amount) {
            return Ok(());
        }

        tracing::warn!(
            peer_id = %peer.id,
            %direction,
            amount,
            "throttling {} packet due to bandwidth exceeding limit",
            direction
        );
        self.metrics.record_throttled(direction, amount);
        Err(Error::InsufficientLiquidity(
            "exceeded money bandwidth, throttling.".to_string(),
        ))
    }
}

/// Build the bucket a peer's configuration asks for in `direction`
pub fn create_bucket_for_peer(peer: &PeerInfo, direction: Direction) -> Option<TokenBucket> {
    let limits = peer.rules.throughput.as_ref()?;
    let capacity = limits.amount_for(direction)?;
    Some(TokenBucket::new(
        capacity,
        Duration::from_millis(limits.refill_period),
    ))
}

#[async_trait]
impl Rule for ThroughputRule {
    fn name(&self) -> &'static str {
        "throughput"
    }

    async fn incoming(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<()> {
        self.check(Direction::Incoming, ctx.incoming_peer(), ctx.prepare().amount)?;
        next.run(ctx).await
    }

    async fn outgoing(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<()> {
        self.check(Direction::Outgoing, ctx.outgoing_peer()?, ctx.outgoing_amount())?;
        next.run(ctx).await
    }
}
