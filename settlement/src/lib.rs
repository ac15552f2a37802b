//! Settlement Engine
//!
//! Tracks the liquidity position of every directly connected peer.
//!
//! # Architecture
//!
//! Each peer owns one balance record bounded by a configured minimum and
//! maximum. Balances move only through [`SettlementEngine::update_balance`],
//! which commits a delta atomically or rejects it without touching state.
//!
//! # Invariants
//!
//! - `minimum <= balance <= maximum` after every successful update
//! - Updates to the same peer are linearizable
//! - Updates to different peers never contend on the same lock
//!
//! # Example
//!
//! ```
//! use settlement::{Config, SettlementEngine};
//!
//! let engine = SettlementEngine::new(Config::default());
//! engine.set_balance("alice", 300, 0, 400);
//!
//! let record = engine.update_balance("alice", 100).unwrap();
//! assert_eq!(record.balance, 400);
//! assert!(engine.update_balance("alice", 1).is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod admin;
pub mod config;
pub mod engine;
pub mod error;
pub mod types;

// Re-exports
pub use admin::BalanceAdmin;
pub use config::{BalanceConfig, Config};
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use types::{Amount, BalanceRecord, BalanceView, UpdateBalanceRequest};
