//! Test-only fixtures and mocks, kept as a regular (non-`cfg(test)`) module so the
//! integration tests under `tests/` can reach them across the crate boundary.
//!
//! Provides:
//! - [`MockAdapter`]: a programmable [`crate::engine::ExchangeAdapter`]
//! - fixture builders for common mutation batches

pub mod helpers;
pub mod mock_adapter;

pub use helpers::*;
pub use mock_adapter::MockAdapter;
