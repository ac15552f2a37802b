//! Property-based tests for balance invariants
//!
//! - Bounds: `minimum <= balance <= maximum` after any sequence of updates
//! - Atomicity: a rejected update leaves the record untouched
//! - Accounting: the final balance equals the start plus accepted deltas

use proptest::prelude::*;
use settlement::{Amount, SettlementEngine};

/// Strategy for generating bounds with the starting balance inside them
fn bounds_strategy() -> impl Strategy<Value = (Amount, Amount, Amount)> {
    (-10_000i64..0, 0i64..10_000).prop_flat_map(|(min, max)| {
        (min..=max).prop_map(move |start| (Amount::from(start), Amount::from(min), Amount::from(max)))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: balance never leaves its bounds
    #[test]
    fn prop_balance_stays_within_bounds(
        (start, min, max) in bounds_strategy(),
        deltas in prop::collection::vec(-5_000i64..5_000, 1..50),
    ) {
        let engine = SettlementEngine::default();
        engine.set_balance("alice", start, min, max);

        let mut expected = start;
        for delta in deltas {
            let delta = Amount::from(delta);
            let before = engine.get_balance("alice").unwrap();

            match engine.update_balance("alice", delta) {
                Ok(record) => {
                    expected += delta;
                    prop_assert_eq!(record.balance, expected);
                }
                Err(_) => {
                    prop_assert!(expected + delta < min || expected + delta > max);
                    prop_assert_eq!(engine.get_balance("alice").unwrap(), before);
                }
            }

            let balance = engine.get_balance("alice").unwrap().balance;
            prop_assert!(min <= balance && balance <= max);
        }

        prop_assert_eq!(engine.get_balance("alice").unwrap().balance, expected);
    }
}
