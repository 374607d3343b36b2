//! Caller-visible error kinds
//!
//! The query surface distinguishes two failure modes: a replica that is temporarily
//! unreliable but expected to recover on its own (`OutOfSyncError`), and a request that
//! is structurally wrong and will never succeed as given (`BookError`).

use std::fmt;

/// The replica is presently unreliable but recoverable; the caller should retry later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutOfSyncError {
    /// No market has been populated yet (`data_store` is empty).
    Initialising,
    /// The market exists but has not reached `active` status.
    NotActive { base: String, quote: String },
    /// A restart has been requested and not yet completed.
    RestartInitialised,
    /// No mutation has been applied within the heartbeat window.
    Stale { base: String, quote: String, age_secs: u64 },
    /// The ladders crossed (`min(asks) <= max(bids)`); a restart has been requested.
    Inconsistent { base: String, quote: String },
}

impl fmt::Display for OutOfSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutOfSyncError::Initialising => write!(f, "replica is initialising"),
            OutOfSyncError::NotActive { base, quote } => {
                write!(f, "market {base}/{quote} is not active")
            }
            OutOfSyncError::RestartInitialised => write!(f, "restart initialised"),
            OutOfSyncError::Stale { base, quote, age_secs } => write!(
                f,
                "no update on {base}/{quote} for {age_secs}s (heartbeat stale)"
            ),
            OutOfSyncError::Inconsistent { base, quote } => {
                write!(f, "inconsistent data on {base}/{quote} (crossed book)")
            }
        }
    }
}

impl std::error::Error for OutOfSyncError {}

/// A structural or usage failure; retrying with the same arguments will never succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// The requested market was never configured on this engine.
    UnknownPair { base: String, quote: String },
    /// An argument was outside its valid range (e.g. `n` not in `1..=5000`).
    InvalidArgument { reason: String },
    /// The upstream adapter observed a protocol violation (duplicate id, malformed frame).
    Protocol { reason: String },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::UnknownPair { base, quote } => {
                write!(f, "unknown currency pair {base}/{quote}")
            }
            BookError::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            BookError::Protocol { reason } => write!(f, "protocol error: {reason}"),
        }
    }
}

impl std::error::Error for BookError {}

/// The unified error type returned by the query surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaError {
    OutOfSync(OutOfSyncError),
    Structural(BookError),
}

impl fmt::Display for ReplicaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicaError::OutOfSync(e) => write!(f, "{e}"),
            ReplicaError::Structural(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ReplicaError {}

impl From<OutOfSyncError> for ReplicaError {
    fn from(e: OutOfSyncError) -> Self {
        ReplicaError::OutOfSync(e)
    }
}

impl From<BookError> for ReplicaError {
    fn from(e: BookError) -> Self {
        ReplicaError::Structural(e)
    }
}

impl ReplicaError {
    /// True for the recoverable kind - callers typically retry after a short delay.
    pub fn is_out_of_sync(&self) -> bool {
        matches!(self, ReplicaError::OutOfSync(_))
    }
}
