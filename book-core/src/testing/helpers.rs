//! Fixture builders for engine and orderbook tests.

use crate::data::{MarketKey, Mutation};

/// A market key for a book/btc pair, useful when the exact currencies don't matter.
pub fn test_market() -> MarketKey {
    MarketKey::new("eth", "btc")
}

/// A small, already-crossed snapshot batch: one ask below one bid.
pub fn crossed_snapshot_batch(market: &MarketKey) -> Vec<Mutation> {
    vec![
        Mutation::UpdateAsk {
            market: market.clone(),
            price: 0.04,
            size: 1.0,
        },
        Mutation::UpdateBid {
            market: market.clone(),
            price: 0.05,
            size: 1.0,
        },
    ]
}

/// A small, healthy snapshot batch: a few levels on each side, non-crossing.
pub fn healthy_snapshot_batch(market: &MarketKey) -> Vec<Mutation> {
    vec![
        Mutation::UpdateAsk {
            market: market.clone(),
            price: 0.051,
            size: 1.0,
        },
        Mutation::UpdateAsk {
            market: market.clone(),
            price: 0.052,
            size: 2.0,
        },
        Mutation::UpdateBid {
            market: market.clone(),
            price: 0.049,
            size: 1.5,
        },
        Mutation::UpdateBid {
            market: market.clone(),
            price: 0.048,
            size: 0.5,
        },
    ]
}
