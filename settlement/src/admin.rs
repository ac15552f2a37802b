//! Admin façade over the settlement engine
//!
//! Exposes the shapes an admin surface serves: all balances keyed by peer,
//! a single peer's triple, and a delta update. Transport (HTTP routing,
//! status codes) belongs to the caller.

use crate::{
    engine::SettlementEngine,
    types::{Amount, BalanceView, UpdateBalanceRequest},
    Error, Result,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Admin access to peer balances
#[derive(Debug, Clone)]
pub struct BalanceAdmin {
    engine: Arc<SettlementEngine>,
}

impl BalanceAdmin {
    /// Create new façade over a shared engine
    pub fn new(engine: Arc<SettlementEngine>) -> Self {
        Self { engine }
    }

    /// Balances and limits for all peers
    pub fn get_balances(&self) -> BTreeMap<String, BalanceView> {
        self.engine
            .list_balances()
            .iter()
            .map(|record| (record.peer_id.clone(), BalanceView::from(record)))
            .collect()
    }

    /// Balance and limits for one peer
    pub fn get_balance(&self, peer_id: &str) -> Result<BalanceView> {
        self.engine
            .get_balance(peer_id)
            .map(|record| BalanceView::from(&record))
    }

    /// Apply `amountDiff` to the peer's balance and return the new triple
    pub fn update_balance(&self, request: &UpdateBalanceRequest) -> Result<BalanceView> {
        let amount_diff: Amount = request.amount_diff.trim().parse().map_err(|_| {
            Error::InvalidAmount(format!(
                "amountDiff must be an integer, got {:?}",
                request.amount_diff
            ))
        })?;

        let record = self.engine.update_balance(&request.peer_id, amount_diff)?;
        Ok(BalanceView::from(&record))
    }
}
