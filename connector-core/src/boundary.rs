//! Error-handling boundary
//!
//! Outermost wrapper around the incoming chain. Whatever happens inside,
//! a structured error, a panic with any payload, or a chain that finishes
//! without a reply, the sender gets exactly one protocol reply back.

use crate::{
    context::RequestContext,
    pipeline::Pipeline,
    services::PacketCodec,
    types::{Prepare, Reject, Reply},
    Error, Result,
};
use bytes::Bytes;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::Instrument;
use uuid::Uuid;

/// Build a reject attributed to `triggered_by`
pub fn error_to_reject(triggered_by: &str, err: &Error) -> Reject {
    Reject {
        code: err.code(),
        triggered_by: triggered_by.to_string(),
        message: err.reject_message(),
        data: Bytes::new(),
    }
}

impl Pipeline {
    /// Process a prepare from `incoming_peer_id` and always produce a reply
    pub async fn handle(&self, incoming_peer_id: &str, prepare: Prepare) -> Reply {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "packet",
            request_id = %request_id,
            peer = %incoming_peer_id,
            destination = %prepare.destination,
            amount = prepare.amount,
        );

        async move {
            self.metrics.record_incoming(prepare.amount);

            let outcome = AssertUnwindSafe(self.run_incoming(request_id, incoming_peer_id, prepare))
                .catch_unwind()
                .await;

            let err = match outcome {
                Ok(Ok(reply)) => return reply,
                Ok(Err(err)) => err,
                Err(payload) => Error::from_panic(payload),
            };

            tracing::error!(error = %err, code = %err.code(), "Error thrown in incoming pipeline");
            self.reject(&err)
        }
        .instrument(span)
        .await
    }

    /// Decode, process and encode one packet
    ///
    /// Undecodable input is answered with a reject like any other failure;
    /// only a failure to encode the reply itself is returned to the caller.
    pub async fn handle_packet(
        &self,
        codec: &dyn PacketCodec,
        incoming_peer_id: &str,
        bytes: &[u8],
    ) -> Result<Vec<u8>> {
        let reply = match codec.parse_prepare(bytes) {
            Ok(prepare) => self.handle(incoming_peer_id, prepare).await,
            Err(err) => {
                tracing::warn!(peer = %incoming_peer_id, error = %err, "Could not parse prepare");
                self.reject(&err)
            }
        };
        codec.serialize_reply(&reply)
    }

    async fn run_incoming(
        &self,
        request_id: Uuid,
        incoming_peer_id: &str,
        prepare: Prepare,
    ) -> Result<Reply> {
        let incoming_peer = self.services.peers.get(incoming_peer_id).await?;
        let mut ctx = RequestContext::new(request_id, prepare, incoming_peer, self.services.clone());

        self.process(&mut ctx).await?;

        ctx.take_reply().ok_or_else(|| {
            tracing::error!("handler did not return a valid value.");
            Error::MalformedResponse("handler did not return a value.".to_string())
        })
    }

    fn reject(&self, err: &Error) -> Reply {
        self.metrics.record_reject(err.code());
        Reply::Reject(error_to_reject(&self.services.self_address(), err))
    }
}
