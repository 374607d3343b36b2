//! Exchange-specific [`ExchangeAdapter`](crate::engine::ExchangeAdapter) implementations.

pub mod bitfinex;
pub mod poloniex;

pub use bitfinex::BitfinexAdapter;
pub use poloniex::PoloniexAdapter;
