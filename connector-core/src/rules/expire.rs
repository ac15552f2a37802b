//! Expire rule
//!
//! Races the packet's deadline against the rest of the outgoing leg. The
//! select point commits exactly one outcome: when the continuation wins the
//! timer is dropped, when the timer wins the continuation is dropped and
//! whatever it would have produced is discarded. Neither outlives the
//! request.

use crate::{
    context::RequestContext,
    pipeline::{Next, Rule},
    Error, Result,
};
use async_trait::async_trait;
use chrono::Utc;

/// Deadline enforcement on the outgoing leg
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpireRule;

impl ExpireRule {
    /// Create the rule
    pub fn new() -> Self {
        Self
    }
}

fn expired() -> Error {
    Error::TransferTimedOut("packet expired.".to_string())
}

#[async_trait]
impl Rule for ExpireRule {
    fn name(&self) -> &'static str {
        "expire"
    }

    async fn outgoing(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<()> {
        let expires_at = ctx.prepare().expires_at;
        let request_id = ctx.id();

        let duration = match (expires_at - Utc::now()).to_std() {
            Ok(duration) if !duration.is_zero() => duration,
            _ => {
                tracing::debug!(%request_id, %expires_at, "packet expired before forwarding");
                return Err(expired());
            }
        };

        tokio::select! {
            biased;

            result = next.run(ctx) => result,
            _ = tokio::time::sleep(duration) => {
                tracing::debug!(%request_id, %expires_at, "packet expired");
                Err(expired())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{prepare, TestHarness};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_downstream_is_slow() {
        let harness = TestHarness::new();
        harness.forwarder.set_delay(Duration::from_secs(11));
        let pipeline = harness.pipeline(vec![Arc::new(ExpireRule::new())]);

        let mut ctx = harness.context("alice", prepare("g.bob.wallet", 10, 10)).await;
        let result = pipeline.process(&mut ctx).await;

        assert!(matches!(result, Err(Error::TransferTimedOut(_))));
        assert!(ctx.reply().is_none());
        assert_eq!(harness.forwarder.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_before_deadline() {
        let harness = TestHarness::new();
        harness.forwarder.set_delay(Duration::from_secs(1));
        let pipeline = harness.pipeline(vec![Arc::new(ExpireRule::new())]);

        let mut ctx = harness.context("alice", prepare("g.bob.wallet", 10, 10)).await;
        let started = tokio::time::Instant::now();
        pipeline.process(&mut ctx).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));

        // Let the original deadline pass; nothing may change afterwards
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(ctx.reply().unwrap().is_fulfill());
    }

    #[tokio::test(start_paused = true)]
    async fn test_downstream_failure_propagates_unchanged() {
        let harness = TestHarness::new();
        harness.forwarder.set_failure("peer hung up");
        let pipeline = harness.pipeline(vec![Arc::new(ExpireRule::new())]);

        let mut ctx = harness.context("alice", prepare("g.bob.wallet", 10, 10)).await;
        let result = pipeline.process(&mut ctx).await;

        assert!(matches!(result, Err(Error::Internal(message)) if message == "peer hung up"));
    }

    #[tokio::test]
    async fn test_already_expired_is_not_forwarded() {
        let harness = TestHarness::new();
        let pipeline = harness.pipeline(vec![Arc::new(ExpireRule::new())]);

        let mut ctx = harness.context("alice", prepare("g.bob.wallet", 10, -1)).await;
        let result = pipeline.process(&mut ctx).await;

        assert!(matches!(result, Err(Error::TransferTimedOut(_))));
        assert_eq!(harness.forwarder.calls(), 0);
    }
}
