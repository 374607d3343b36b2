//! Sorted replica state for one or more markets.
//!
//! A [`MarketState`] holds the two sides of one market's book; a [`PriceLadder`] is
//! one side. The engine is the sole writer, applying [`crate::data::Mutation`]s in
//! the order adapters decode them; the query surface reads through a shared lock.

pub mod ladder;
pub mod market;

pub use ladder::{PriceLadder, Side};
pub use market::MarketState;
