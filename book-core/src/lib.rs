//! A client library that maintains a live, in-memory replica of limit order books for
//! crypto trading pairs, fed by exchange websocket push updates.
//!
//! The engine runs a generic connect → subscribe → receive → decode → apply → verify →
//! restart loop; exchange-specific wire formats live entirely behind the
//! [`ExchangeAdapter`] trait in [`adapters`]. Callers get back an [`Engine`] handle that
//! is cheap to clone and safe to query from any thread while the supervisor task keeps
//! writing.
//!
//! ```no_run
//! use book_core::{adapters::BitfinexAdapter, config::{EngineConfig, Exchange}, data::MarketKey, Engine};
//!
//! # async fn run() {
//! let config = EngineConfig::new(Exchange::Bitfinex, vec![MarketKey::new("eth", "btc")]);
//! let engine = Engine::spawn(config, BitfinexAdapter::new());
//!
//! // ... wait for the first snapshot to land, then:
//! let market = MarketKey::new("eth", "btc");
//! match engine.top_asks(&market, 10, None) {
//!     Ok(levels) => println!("{levels:?}"),
//!     Err(err) if err.is_out_of_sync() => println!("not ready yet: {err}"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod core;
pub mod data;
pub mod engine;
pub mod orderbook;
pub mod resilience;
pub mod testing;
pub mod utils;

pub use core::{BookError, OutOfSyncError, ReplicaError};
pub use data::{MarketKey, MarketStatus, Mutation};
pub use engine::{Engine, ExchangeAdapter};

/// Convenient imports for callers embedding the engine.
pub mod prelude {
    pub use crate::config::{EngineConfig, Exchange};
    pub use crate::{BookError, Engine, ExchangeAdapter, MarketKey, OutOfSyncError, ReplicaError};
}
