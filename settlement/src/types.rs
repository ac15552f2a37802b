//! Core types for settlement engine

use serde::{Deserialize, Serialize};

/// Signed balance amount in the asset's smallest unit
pub type Amount = i128;

/// Liquidity position of one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRecord {
    /// Peer ID
    pub peer_id: String,

    /// Current balance
    pub balance: Amount,

    /// Lowest balance the peer may reach
    pub minimum: Amount,

    /// Highest balance the peer may reach
    pub maximum: Amount,
}

impl BalanceRecord {
    /// Whether `balance` lies inside this record's bounds
    pub fn admits(&self, balance: Amount) -> bool {
        self.minimum <= balance && balance <= self.maximum
    }
}

/// Balance triple as exposed to admin callers
///
/// Amounts are rendered as decimal strings so that no JSON consumer
/// truncates them to a double.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    /// Current balance
    pub balance: String,

    /// Lower bound
    pub minimum: String,

    /// Upper bound
    pub maximum: String,
}

impl From<&BalanceRecord> for BalanceView {
    fn from(record: &BalanceRecord) -> Self {
        Self {
            balance: record.balance.to_string(),
            minimum: record.minimum.to_string(),
            maximum: record.maximum.to_string(),
        }
    }
}

/// Admin request to move a peer's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBalanceRequest {
    /// Peer ID
    pub peer_id: String,

    /// Signed delta as a decimal string
    pub amount_diff: String,
}
