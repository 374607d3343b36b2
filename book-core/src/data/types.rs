//! Core domain types shared between adapters, the engine, and the query surface.

use std::fmt;

/// An ordered pair `(base, quote)` of lowercase currency codes, unique within an engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarketKey {
    pub base: String,
    pub quote: String,
}

impl MarketKey {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_lowercase(),
            quote: quote.into().to_lowercase(),
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Lifecycle status of one market's replica, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    /// `MarketState` exists but no snapshot has been absorbed yet.
    Inactive,
    /// Subscription sent, waiting for the snapshot/last mutation of the first batch.
    Initialising,
    /// Snapshot absorbed; the replica is live.
    Active,
}

/// A normalized mutation produced by an adapter from one wire frame.
///
/// Adapters never leak raw JSON past this boundary (§9 "dynamic payloads").
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Heartbeat,
    UpdateAsk { market: MarketKey, price: f64, size: f64 },
    UpdateBid { market: MarketKey, price: f64, size: f64 },
    RemoveAsk { market: MarketKey, price: f64 },
    RemoveBid { market: MarketKey, price: f64 },
}

impl Mutation {
    /// The market this mutation addresses, if any (`Heartbeat` addresses none).
    pub fn market(&self) -> Option<&MarketKey> {
        match self {
            Mutation::Heartbeat => None,
            Mutation::UpdateAsk { market, .. }
            | Mutation::UpdateBid { market, .. }
            | Mutation::RemoveAsk { market, .. }
            | Mutation::RemoveBid { market, .. } => Some(market),
        }
    }
}
