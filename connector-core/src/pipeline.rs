//! Rule chain
//!
//! A pipeline is an ordered list of rules. Each rule may handle the incoming
//! leg, the outgoing leg, or both, and receives an explicit continuation
//! ([`Next`]) for the rest of the chain:
//!
//! ```text
//! rule[0].incoming → … → rule[n].incoming → switch
//!     → rule[0].outgoing → … → rule[n].outgoing → forward
//! ```
//!
//! A rule may act before calling `next`, refuse by returning an error
//! without calling it, or act on the reply after it returns.

use crate::{
    context::RequestContext,
    metrics::Metrics,
    services::Services,
    types::{Direction, Reply},
    Error, Result,
};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// One stage of the chain
///
/// Both handlers default to passing straight through.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Handle the leg from the sending peer into the connector
    async fn incoming(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<()> {
        next.run(ctx).await
    }

    /// Handle the leg from the connector to the next hop
    async fn outgoing(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<()> {
        next.run(ctx).await
    }
}

/// Continuation for the remainder of the chain
pub struct Next<'a> {
    pipeline: &'a Pipeline,
    rules: &'a [Arc<dyn Rule>],
    direction: Direction,
}

impl<'a> Next<'a> {
    /// Run the remaining stages
    pub fn run<'c>(self, ctx: &'c mut RequestContext) -> BoxFuture<'c, Result<()>>
    where
        'a: 'c,
    {
        Box::pin(async move {
            match self.rules.split_first() {
                Some((rule, rest)) => {
                    let next = Next {
                        pipeline: self.pipeline,
                        rules: rest,
                        direction: self.direction,
                    };
                    match self.direction {
                        Direction::Incoming => rule.incoming(ctx, next).await,
                        Direction::Outgoing => rule.outgoing(ctx, next).await,
                    }
                }
                None => match self.direction {
                    Direction::Incoming => self.pipeline.switch(ctx).await,
                    Direction::Outgoing => self.pipeline.forward(ctx).await,
                },
            }
        })
    }

    /// Leg this continuation belongs to
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("direction", &self.direction)
            .field("remaining", &self.rules.len())
            .finish()
    }
}

/// Ordered rule chain with its shared services
pub struct Pipeline {
    pub(crate) rules: Vec<Arc<dyn Rule>>,
    pub(crate) services: Services,
    pub(crate) metrics: Arc<Metrics>,
}

impl Pipeline {
    /// Create a pipeline; rule order is fixed from here on
    pub fn new(services: Services, rules: Vec<Arc<dyn Rule>>, metrics: Arc<Metrics>) -> Self {
        tracing::info!(
            rules = ?rules.iter().map(|rule| rule.name()).collect::<Vec<_>>(),
            "Pipeline constructed"
        );
        Self {
            rules,
            services,
            metrics,
        }
    }

    /// Shared services
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run the full chain for `ctx` without the error boundary
    ///
    /// Failures propagate to the caller; use [`Pipeline::handle`] for the
    /// always-replies entry point.
    pub async fn process(&self, ctx: &mut RequestContext) -> Result<()> {
        Next {
            pipeline: self,
            rules: &self.rules,
            direction: Direction::Incoming,
        }
        .run(ctx)
        .await
    }

    /// Resolve the next hop and enter the outgoing leg
    async fn switch(&self, ctx: &mut RequestContext) -> Result<()> {
        let destination = &ctx.prepare().destination;
        let next_hop = self.services.router.next_hop(destination).ok_or_else(|| {
            Error::Unreachable(format!("no route found. destination={}", destination))
        })?;

        let outgoing = self.services.peers.get(&next_hop).await?;
        tracing::trace!(next_hop = %outgoing.id, "Resolved next hop");

        let amount = ctx.prepare().amount;
        ctx.set_outgoing_peer(outgoing);
        ctx.set_outgoing_amount(amount);

        Next {
            pipeline: self,
            rules: &self.rules,
            direction: Direction::Outgoing,
        }
        .run(ctx)
        .await
    }

    /// Innermost stage: hand the packet to the transport
    async fn forward(&self, ctx: &mut RequestContext) -> Result<()> {
        let prepare = ctx.outgoing_prepare();
        self.metrics.record_outgoing(prepare.amount);
        let reply = self
            .services
            .forwarder
            .send(ctx.outgoing_peer()?, &prepare)
            .await?;

        if let Reply::Fulfill(fulfill) = &reply {
            if !fulfill.matches(&prepare.execution_condition) {
                return Err(Error::WrongCondition(
                    "fulfillment did not match expected value.".to_string(),
                ));
            }
        }

        ctx.set_reply(reply);
        Ok(())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "rules",
                &self.rules.iter().map(|rule| rule.name()).collect::<Vec<_>>(),
            )
            .field("services", &self.services)
            .finish()
    }
}
