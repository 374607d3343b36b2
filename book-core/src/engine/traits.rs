//! The seam between the generic engine and one exchange's wire protocol.

use crate::data::{MarketKey, Mutation};
use std::time::Duration;

/// Everything the engine needs from one exchange integration.
///
/// Implementors own their own websocket connection; the engine never touches raw
/// frames, only the [`Mutation`]s an adapter decodes from them. Native `async fn` in
/// this trait is fine here because the engine is generic over `A: ExchangeAdapter`,
/// never boxed as `dyn ExchangeAdapter`.
#[allow(async_fn_in_trait)]
pub trait ExchangeAdapter: Send {
    /// Opens the transport. Must return within `timeout` or err out.
    async fn connect(&mut self, timeout: Duration) -> anyhow::Result<()>;

    /// Sends subscribe frames for every market the engine was configured with.
    async fn subscribe(&mut self, markets: &[MarketKey]) -> anyhow::Result<()>;

    /// Waits for and decodes the next wire frame.
    ///
    /// `Ok(Some(mutations))` - one batch of mutations to apply atomically.
    /// `Ok(None)` - the connection closed cleanly; the engine should reconnect.
    /// `Err(_)` - a protocol or transport fault; the engine should reconnect.
    async fn receive(&mut self) -> anyhow::Result<Option<Vec<Mutation>>>;

    /// Best-effort teardown before a reconnect attempt.
    async fn disconnect(&mut self);
}
