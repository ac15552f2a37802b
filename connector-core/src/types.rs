//! Core packet and peer types
//!
//! Amounts are unsigned 64-bit integers in the asset's smallest unit; no
//! floating point ever touches money.

use crate::error::ErrorCode;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Default refill period of a throughput bucket (milliseconds)
pub const DEFAULT_REFILL_PERIOD_MS: u64 = 1000;

/// Proposed value transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prepare {
    /// Hierarchical destination address (`g.alice.wallet`)
    pub destination: String,

    /// Amount in the asset's smallest unit
    pub amount: u64,

    /// Absolute expiry
    pub expires_at: DateTime<Utc>,

    /// SHA-256 digest the fulfillment must hash to
    pub execution_condition: [u8; 32],

    /// Opaque payload
    #[serde(default)]
    pub data: Bytes,
}

/// Successful outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfill {
    /// Preimage of the execution condition
    pub fulfillment: [u8; 32],

    /// Opaque payload
    #[serde(default)]
    pub data: Bytes,
}

impl Fulfill {
    /// Whether this fulfillment satisfies `condition`
    pub fn matches(&self, condition: &[u8; 32]) -> bool {
        let digest: [u8; 32] = Sha256::digest(self.fulfillment).into();
        &digest == condition
    }
}

/// Failed outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reject {
    /// Reject code
    pub code: ErrorCode,

    /// Address of the node that produced the reject
    pub triggered_by: String,

    /// Human-readable reason
    pub message: String,

    /// Opaque payload
    #[serde(default)]
    pub data: Bytes,
}

/// Terminal outcome of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Reply {
    /// Fulfillment
    Fulfill(Fulfill),
    /// Rejection
    Reject(Reject),
}

impl Reply {
    /// Whether the reply is a fulfillment
    pub fn is_fulfill(&self) -> bool {
        matches!(self, Reply::Fulfill(_))
    }

    /// The reject, if any
    pub fn as_reject(&self) -> Option<&Reject> {
        match self {
            Reply::Reject(reject) => Some(reject),
            Reply::Fulfill(_) => None,
        }
    }
}

/// Business relationship with a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerRelation {
    /// Upstream provider
    Parent,
    /// Equal peer
    Peer,
    /// Downstream customer
    Child,
}

/// Throughput limits for one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughputLimits {
    /// Refill period in milliseconds
    #[serde(default = "default_refill_period")]
    pub refill_period: u64,

    /// Amount the peer may send us per period
    #[serde(default)]
    pub incoming_amount: Option<u64>,

    /// Amount we may send the peer per period
    #[serde(default)]
    pub outgoing_amount: Option<u64>,
}

fn default_refill_period() -> u64 {
    DEFAULT_REFILL_PERIOD_MS
}

impl ThroughputLimits {
    /// Limit configured for a direction; zero counts as unlimited
    pub fn amount_for(&self, direction: Direction) -> Option<u64> {
        let amount = match direction {
            Direction::Incoming => self.incoming_amount,
            Direction::Outgoing => self.outgoing_amount,
        };
        amount.filter(|amount| *amount > 0)
    }
}

/// Per-peer rule configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRules {
    /// Throughput limits
    #[serde(default)]
    pub throughput: Option<ThroughputLimits>,
}

/// Peer record as read from the peer directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    /// Unique peer ID
    pub id: String,

    /// Relationship
    pub relation: PeerRelation,

    /// Rule configuration
    #[serde(default)]
    pub rules: PeerRules,

    /// Endpoint used by the forwarder
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer token used by the forwarder
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl PeerInfo {
    /// Create a peer with no rules or transport
    pub fn new(id: impl Into<String>, relation: PeerRelation) -> Self {
        Self {
            id: id.into(),
            relation,
            rules: PeerRules::default(),
            url: None,
            auth_token: None,
        }
    }

    /// Attach throughput limits
    pub fn with_throughput(mut self, limits: ThroughputLimits) -> Self {
        self.rules.throughput = Some(limits);
        self
    }
}

/// Direction a packet travels relative to this node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// From the sending peer into the connector
    Incoming,
    /// From the connector to the next hop
    Outgoing,
}

impl Direction {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
