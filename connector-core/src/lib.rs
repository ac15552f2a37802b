//! Connector Core
//!
//! Packet-processing pipeline for a value-transfer connector: a prepare
//! packet arrives from a peer, passes an ordered chain of rules, is forwarded
//! toward its destination, and a fulfill or reject travels back.
//!
//! # Architecture
//!
//! ```text
//!  prepare ──► boundary ──► rule[0].incoming ─► … ─► rule[n].incoming
//!                                                        │
//!                                                     switch (next hop)
//!                                                        │
//!  reply   ◄── boundary ◄── rule[0].outgoing ◄─ … ◄─ rule[n].outgoing ◄─► forwarder
//! ```
//!
//! - **Boundary**: every failure, structured or a panic, becomes a reject
//! - **Rules**: chain-of-responsibility stages with an explicit continuation
//! - **Expire**: races the packet deadline against the downstream call
//! - **Throughput**: per-peer, per-direction token buckets
//!
//! # Invariants
//!
//! - Exactly one reply per request
//! - Rule order is fixed at construction; replies unwind in mirror order
//! - Shared state (buckets, balances) is serialized per peer only

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod boundary;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod peers;
pub mod pipeline;
pub mod router;
pub mod rules;
pub mod services;
pub mod telemetry;
pub mod token_bucket;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use boundary::error_to_reject;
pub use config::Config;
pub use context::RequestContext;
pub use error::{Error, ErrorCode, Result};
pub use metrics::Metrics;
pub use pipeline::{Next, Pipeline, Rule};
pub use rules::{ExpireRule, ThroughputRule};
pub use services::{Forwarder, PacketCodec, PeerDirectory, Router, Services, SELF_PEER_ID};
pub use token_bucket::TokenBucket;
pub use types::{Direction, Fulfill, PeerInfo, PeerRelation, Prepare, Reject, Reply};
