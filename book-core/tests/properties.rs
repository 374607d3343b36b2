//! Property-based tests for the invariants a replica must uphold regardless of the
//! exact sequence of mutations applied to it.

use approx::assert_relative_eq;
use proptest::prelude::*;

use book_core::orderbook::{PriceLadder, Side};
use book_core::resilience::{HeartbeatMonitor, SequenceTracker};

fn arb_price() -> impl Strategy<Value = f64> {
    (1u32..100_000).prop_map(|cents| cents as f64 / 100.0)
}

fn arb_size() -> impl Strategy<Value = f64> {
    (1u32..10_000).prop_map(|hundredths| hundredths as f64 / 100.0)
}

proptest! {
    /// I1: a ladder never holds two levels at the same price - the last write wins.
    #[test]
    fn i1_upsert_never_duplicates_a_price(
        prices in prop::collection::vec(arb_price(), 1..50),
        sizes in prop::collection::vec(arb_size(), 1..50),
    ) {
        let mut ladder = PriceLadder::new(Side::Ask);
        let n = prices.len().min(sizes.len());
        for i in 0..n {
            ladder.upsert(prices[i], sizes[i]);
        }

        let mut unique_prices: Vec<f64> = prices[..n].to_vec();
        unique_prices.sort_by(|a, b| a.total_cmp(b));
        unique_prices.dedup();

        prop_assert_eq!(ladder.len(), unique_prices.len());
    }

    /// I2: `top(k)` is always returned in the ladder's declared sort order.
    #[test]
    fn i2_ask_ladder_top_is_always_ascending(
        levels in prop::collection::vec((arb_price(), arb_size()), 1..50),
    ) {
        let mut ladder = PriceLadder::new(Side::Ask);
        for (price, size) in &levels {
            ladder.upsert(*price, *size);
        }

        let top = ladder.top(ladder.len());
        for window in top.windows(2) {
            prop_assert!(window[0].0 < window[1].0);
        }
    }

    #[test]
    fn i2_bid_ladder_top_is_always_descending(
        levels in prop::collection::vec((arb_price(), arb_size()), 1..50),
    ) {
        let mut ladder = PriceLadder::new(Side::Bid);
        for (price, size) in &levels {
            ladder.upsert(*price, *size);
        }

        let top = ladder.top(ladder.len());
        for window in top.windows(2) {
            prop_assert!(window[0].0 > window[1].0);
        }
    }

    /// I4: a sequence tracker accepts exactly the immediate successor of the last
    /// value it saw, and nothing else.
    #[test]
    fn i4_sequence_tracker_only_accepts_the_immediate_successor(
        start in 0u64..1_000_000,
        offset in 0i64..10,
    ) {
        let mut tracker = SequenceTracker::new();
        tracker.check(start);

        let next = (start as i64 + offset) as u64;
        let continuous = tracker.check(next);

        prop_assert_eq!(continuous, offset == 1);
    }

    /// depth_at matches a brute-force lookup over every inserted level.
    #[test]
    fn depth_at_matches_last_write_per_price(
        levels in prop::collection::vec((arb_price(), arb_size()), 1..50),
    ) {
        let mut ladder = PriceLadder::new(Side::Ask);
        let mut expected = std::collections::HashMap::new();
        for (price, size) in &levels {
            ladder.upsert(*price, *size);
            expected.insert(price.to_bits(), *size);
        }

        for (price_bits, size) in expected {
            let price = f64::from_bits(price_bits);
            assert_relative_eq!(ladder.depth_at(price), size, epsilon = 1e-9);
        }
    }
}

/// I5: freshness flips to stale exactly once the given window elapses.
#[test]
fn i5_heartbeat_monitor_flips_to_stale_after_window() {
    let window = std::time::Duration::from_millis(20);
    let mut monitor = HeartbeatMonitor::new();
    assert_eq!(monitor.freshness(window), None);

    monitor.mark_seen();
    assert!(monitor.is_fresh(window));

    std::thread::sleep(std::time::Duration::from_millis(40));
    assert!(!monitor.is_fresh(window));
}
