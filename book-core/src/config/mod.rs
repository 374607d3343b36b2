//! Engine configuration.
//!
//! One [`EngineConfig`] names the exchange, the markets to replicate, and the
//! transport/liveness tuning the engine uses (no compile-time feature flags, no
//! TOML file) - everything this engine needs is small enough to construct in code.

pub mod types;

pub use types::{EngineConfig, Exchange};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MarketKey;
    use std::time::Duration;

    #[test]
    fn builder_methods_override_defaults() {
        let config = EngineConfig::new(Exchange::Bitfinex, vec![MarketKey::new("eth", "btc")])
            .with_transport_timeout(Duration::from_secs(3))
            .with_heartbeat_window(Duration::from_secs(30));

        assert_eq!(config.transport_timeout, Duration::from_secs(3));
        assert_eq!(config.heartbeat_window, Duration::from_secs(30));
        assert_eq!(config.markets.len(), 1);
    }
}
