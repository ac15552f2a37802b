//! Token bucket rate limiter
//!
//! The bucket starts full. Every whole refill period that elapses adds one
//! full `capacity` worth of tokens, capped at `capacity`; partial periods
//! carry over to the next call rather than being lost. A withdrawal either
//! takes the whole amount or nothing.
//!
//! Time comes from [`tokio::time::Instant`] so paused-clock tests can drive
//! refills deterministically.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Token bucket keyed by nothing; callers own the mapping to peers
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum tokens, also the amount added per period
    capacity: u64,

    /// Length of one refill period
    refill_period: Duration,

    /// Mutable state, one lock per bucket
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    /// Tokens currently available (0..=capacity)
    available: u64,

    /// Start of the current, not yet completed, refill period
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket
    ///
    /// A zero refill period is treated as one millisecond.
    pub fn new(capacity: u64, refill_period: Duration) -> Self {
        Self::new_at(capacity, refill_period, Instant::now())
    }

    /// Create a full bucket whose first period starts at `now`
    pub fn new_at(capacity: u64, refill_period: Duration, now: Instant) -> Self {
        Self {
            capacity,
            refill_period: refill_period.max(Duration::from_millis(1)),
            state: Mutex::new(BucketState {
                available: capacity,
                last_refill: now,
            }),
        }
    }

    /// Withdraw `amount` tokens if available
    pub fn take(&self, amount: u64) -> bool {
        self.take_at(Instant::now(), amount)
    }

    /// Withdraw `amount` tokens as of `now`
    ///
    /// Refusal leaves the bucket untouched apart from refill accounting.
    pub fn take_at(&self, now: Instant, amount: u64) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state, now);

        if state.available >= amount {
            state.available -= amount;
            true
        } else {
            false
        }
    }

    /// Tokens available right now
    pub fn available(&self) -> u64 {
        self.available_at(Instant::now())
    }

    /// Tokens available as of `now`
    pub fn available_at(&self, now: Instant) -> u64 {
        let mut state = self.state.lock();
        self.refill(&mut state, now);
        state.available
    }

    /// Maximum tokens
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Refill period
    pub fn refill_period(&self) -> Duration {
        self.refill_period
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        let period = self.refill_period.as_nanos();
        let periods = elapsed.as_nanos() / period;
        if periods == 0 {
            return;
        }

        let refilled = u128::from(state.available)
            .saturating_add(periods.saturating_mul(u128::from(self.capacity)));
        state.available = refilled.min(u128::from(self.capacity)) as u64;

        // Keep the unfinished part of the current period
        let remainder = Duration::from_nanos((elapsed.as_nanos() % period) as u64);
        state.last_refill = now.checked_sub(remainder).unwrap_or(now);
    }
}
