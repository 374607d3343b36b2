//! Domain types flowing between adapters, the engine, and the orderbook.
//!
//! An adapter decodes one wire frame into an ordered list of [`Mutation`]s; the engine
//! applies each to the addressed market's [`crate::orderbook::MarketState`]. No raw JSON
//! crosses this boundary.

pub mod types;

pub use types::{MarketKey, MarketStatus, Mutation};
