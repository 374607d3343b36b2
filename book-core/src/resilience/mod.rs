//! Resilience patterns backing the engine's verify/recover loop.
//!
//! - [`backoff`] (the reconnect delay schedule, §4.2)
//! - [`gap_detector`] (sequence continuity per market, I4)
//! - [`stale_data`] (process-wide heartbeat freshness, I5)
//! - [`panic`] (a global panic hook for graceful process shutdown)

pub mod backoff;
pub mod gap_detector;
pub mod panic;
pub mod stale_data;

pub use backoff::{BackoffConfig, ReconnectBackoff};
pub use gap_detector::SequenceTracker;
pub use panic::install_panic_handler;
pub use stale_data::{Freshness, HeartbeatMonitor};
