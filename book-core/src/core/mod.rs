//! Core error types shared across the engine, adapters, and query surface.

pub mod errors;

pub use errors::{BookError, OutOfSyncError, ReplicaError};
