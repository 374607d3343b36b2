use std::time::Duration;

use crate::data::MarketKey;

/// One exchange's websocket endpoint and the adapter that speaks its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Bitfinex,
    Poloniex,
}

/// Markets to replicate plus the transport and liveness tuning the engine uses.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub exchange: Exchange,
    pub markets: Vec<MarketKey>,
    /// Time budget for the initial connect + subscribe handshake.
    pub transport_timeout: Duration,
    /// Longest gap between mutations before a market is considered stale (I5).
    pub heartbeat_window: Duration,
}

impl EngineConfig {
    pub fn new(exchange: Exchange, markets: Vec<MarketKey>) -> Self {
        Self {
            exchange,
            markets,
            transport_timeout: Duration::from_secs(10),
            heartbeat_window: Duration::from_secs(10),
        }
    }

    pub fn with_transport_timeout(mut self, timeout: Duration) -> Self {
        self.transport_timeout = timeout;
        self
    }

    pub fn with_heartbeat_window(mut self, window: Duration) -> Self {
        self.heartbeat_window = window;
        self
    }
}
