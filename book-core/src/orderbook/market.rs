//! Per-market replica state: two ladders, the last applied sequence, and lifecycle status.

use std::time::Instant;

use crate::data::MarketStatus;
use crate::orderbook::ladder::{PriceLadder, Side};

/// One market's full replica, per spec §3 `MarketState`.
#[derive(Debug)]
pub struct MarketState {
    pub asks: PriceLadder,
    pub bids: PriceLadder,
    pub last_sequence: Option<u64>,
    pub status: MarketStatus,
    pub last_mutation_at: Option<Instant>,
}

impl MarketState {
    pub fn new() -> Self {
        Self {
            asks: PriceLadder::new(Side::Ask),
            bids: PriceLadder::new(Side::Bid),
            last_sequence: None,
            status: MarketStatus::Inactive,
            last_mutation_at: None,
        }
    }

    /// `min(ask) <= max(bid)`: the two ladders have crossed and the replica is
    /// no longer trustworthy (invariant I3).
    pub fn is_crossed(&self) -> bool {
        match (self.asks.best_price(), self.bids.best_price()) {
            (Some(ask), Some(bid)) => ask <= bid,
            _ => false,
        }
    }

    /// `(best_bid + best_ask) / 2`, or `None` if either side is empty.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.asks.best_price(), self.bids.best_price()) {
            (Some(ask), Some(bid)) => Some((ask + bid) / 2.0),
            _ => None,
        }
    }

    /// Discards both ladders and the sequence cursor, keeping the market entry
    /// itself so callers don't need to re-discover it (used by the restart path).
    pub fn reset(&mut self) {
        self.asks = PriceLadder::new(Side::Ask);
        self.bids = PriceLadder::new(Side::Bid);
        self.last_sequence = None;
        self.status = MarketStatus::Inactive;
        self.last_mutation_at = None;
    }
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_market_has_no_mid_price() {
        let market = MarketState::new();
        assert_eq!(market.mid_price(), None);
        assert!(!market.is_crossed());
    }

    #[test]
    fn mid_price_averages_best_quotes() {
        let mut market = MarketState::new();
        market.asks.upsert(0.06, 1.0);
        market.bids.upsert(0.04, 1.0);
        assert_eq!(market.mid_price(), Some(0.05));
    }

    #[test]
    fn crossed_book_detected_when_best_bid_meets_or_exceeds_best_ask() {
        let mut market = MarketState::new();
        market.asks.upsert(0.05, 1.0);
        market.bids.upsert(0.05, 1.0);
        assert!(market.is_crossed());

        market.bids.remove(0.05);
        market.bids.upsert(0.049, 1.0);
        assert!(!market.is_crossed());
    }

    #[test]
    fn reset_clears_ladders_sequence_and_status() {
        let mut market = MarketState::new();
        market.asks.upsert(0.05, 1.0);
        market.last_sequence = Some(42);
        market.status = MarketStatus::Active;

        market.reset();

        assert!(market.asks.is_empty());
        assert_eq!(market.last_sequence, None);
        assert_eq!(market.status, MarketStatus::Inactive);
    }
}
