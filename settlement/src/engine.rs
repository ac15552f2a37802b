//! Main settlement engine
//!
//! Keeps one bounded balance record per peer. Records live in a sharded
//! concurrent map; an update holds the shard's write guard for the whole
//! read-modify-write, so two deltas against the same peer are applied one
//! after the other and never observe a half-committed state.

use crate::{
    config::Config,
    types::{Amount, BalanceRecord},
    Error, Result,
};
use dashmap::DashMap;

/// Settlement engine
#[derive(Debug)]
pub struct SettlementEngine {
    /// Balance records keyed by peer ID
    balances: DashMap<String, BalanceRecord>,

    /// Configuration
    config: Config,
}

impl SettlementEngine {
    /// Create new settlement engine, seeding any configured balances
    pub fn new(config: Config) -> Self {
        let engine = Self {
            balances: DashMap::new(),
            config,
        };

        for seed in &engine.config.balances {
            engine.set_balance(
                seed.peer_id.clone(),
                Amount::from(seed.balance),
                Amount::from(seed.minimum),
                Amount::from(seed.maximum),
            );
        }

        engine
    }

    /// Create or overwrite the balance record of a peer
    ///
    /// No validation against the previous record is done; this is the
    /// (re)initialization path.
    pub fn set_balance(
        &self,
        peer_id: impl Into<String>,
        balance: Amount,
        minimum: Amount,
        maximum: Amount,
    ) -> BalanceRecord {
        let peer_id = peer_id.into();
        let record = BalanceRecord {
            peer_id: peer_id.clone(),
            balance,
            minimum,
            maximum,
        };

        tracing::info!(
            peer_id = %peer_id,
            balance = %balance,
            minimum = %minimum,
            maximum = %maximum,
            "Balance set"
        );

        self.balances.insert(peer_id, record.clone());
        record
    }

    /// Apply a signed delta to a peer's balance
    ///
    /// Commits only when the resulting balance stays inside the record's
    /// bounds. On failure the record is left exactly as it was.
    pub fn update_balance(&self, peer_id: &str, amount_diff: Amount) -> Result<BalanceRecord> {
        let mut record = self
            .balances
            .get_mut(peer_id)
            .ok_or_else(|| Error::PeerNotFound(peer_id.to_string()))?;

        let new_balance = match record.balance.checked_add(amount_diff) {
            Some(value) if record.admits(value) => value,
            _ => {
                let err = Error::OutOfBounds {
                    peer_id: peer_id.to_string(),
                    balance: record.balance,
                    amount_diff,
                    minimum: record.minimum,
                    maximum: record.maximum,
                };
                tracing::warn!(peer_id = %peer_id, amount_diff = %amount_diff, "Balance update rejected: {}", err);
                return Err(err);
            }
        };

        record.balance = new_balance;
        tracing::debug!(peer_id = %peer_id, amount_diff = %amount_diff, balance = %new_balance, "Balance updated");

        Ok(record.clone())
    }

    /// Get the balance record of a peer
    pub fn get_balance(&self, peer_id: &str) -> Result<BalanceRecord> {
        self.balances
            .get(peer_id)
            .map(|record| record.clone())
            .ok_or_else(|| Error::PeerNotFound(peer_id.to_string()))
    }

    /// List all balance records, ordered by peer ID
    pub fn list_balances(&self) -> Vec<BalanceRecord> {
        let mut records: Vec<BalanceRecord> =
            self.balances.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        records
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for SettlementEngine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalanceConfig;
    use std::sync::Arc;

    #[test]
    fn test_balance_round_trip() {
        let engine = SettlementEngine::default();
        engine.set_balance("alice", 300, 0, 400);

        let record = engine.get_balance("alice").unwrap();
        assert_eq!((record.balance, record.minimum, record.maximum), (300, 0, 400));

        let record = engine.update_balance("alice", 100).unwrap();
        assert_eq!((record.balance, record.minimum, record.maximum), (400, 0, 400));

        let err = engine.update_balance("alice", 1).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { balance: 400, amount_diff: 1, .. }));
        assert_eq!(engine.get_balance("alice").unwrap().balance, 400);
    }

    #[test]
    fn test_update_below_minimum_rejected() {
        let engine = SettlementEngine::default();
        engine.set_balance("bob", 10, -50, 100);

        assert_eq!(engine.update_balance("bob", -60).unwrap().balance, -50);
        assert!(engine.update_balance("bob", -1).is_err());
        assert_eq!(engine.get_balance("bob").unwrap().balance, -50);
    }

    #[test]
    fn test_overflowing_delta_rejected() {
        let engine = SettlementEngine::default();
        engine.set_balance("carol", Amount::MAX - 1, 0, Amount::MAX);

        assert!(matches!(
            engine.update_balance("carol", 5),
            Err(Error::OutOfBounds { .. })
        ));
        assert_eq!(engine.get_balance("carol").unwrap().balance, Amount::MAX - 1);
    }

    #[test]
    fn test_unknown_peer() {
        let engine = SettlementEngine::default();

        assert_eq!(
            engine.update_balance("nobody", 1),
            Err(Error::PeerNotFound("nobody".to_string()))
        );
        assert!(engine.get_balance("nobody").unwrap_err().is_not_found());
    }

    #[test]
    fn test_set_balance_overwrites_without_validation() {
        let engine = SettlementEngine::default();
        engine.set_balance("alice", 300, 0, 400);
        engine.set_balance("alice", 900, 0, 100);

        let record = engine.get_balance("alice").unwrap();
        assert_eq!(record.balance, 900);
        assert_eq!(record.maximum, 100);
    }

    #[test]
    fn test_list_balances_sorted() {
        let engine = SettlementEngine::default();
        engine.set_balance("bob", 100, 0, 200);
        engine.set_balance("alice", 300, 0, 400);

        let peers: Vec<String> = engine.list_balances().into_iter().map(|r| r.peer_id).collect();
        assert_eq!(peers, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_seeded_from_config() {
        let engine = SettlementEngine::new(Config {
            balances: vec![BalanceConfig {
                peer_id: "alice".to_string(),
                balance: 5,
                minimum: -10,
                maximum: 10,
            }],
            ..Default::default()
        });

        assert_eq!(engine.get_balance("alice").unwrap().minimum, -10);
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_writes() {
        let engine = Arc::new(SettlementEngine::default());
        engine.set_balance("alice", 0, 0, 1_000);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let engine = engine.clone();
                scope.spawn(move || {
                    for _ in 0..100 {
                        engine.update_balance("alice", 1).unwrap();
                    }
                });
            }
        });

        assert_eq!(engine.get_balance("alice").unwrap().balance, 800);
    }

    #[test]
    fn test_concurrent_updates_respect_maximum() {
        let engine = Arc::new(SettlementEngine::default());
        engine.set_balance("alice", 0, 0, 50);

        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..10)
                .map(|_| {
                    let engine = engine.clone();
                    scope.spawn(move || {
                        (0..10).filter(|_| engine.update_balance("alice", 1).is_ok()).count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(accepted, 50);
        assert_eq!(engine.get_balance("alice").unwrap().balance, 50);
    }
}
