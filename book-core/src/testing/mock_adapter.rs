//! A scripted [`ExchangeAdapter`] for exercising the engine without a live websocket.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::data::{MarketKey, Mutation};
use crate::engine::ExchangeAdapter;

/// Replays a fixed script of batches, each delivered by one `receive()` call.
///
/// Can be told to fail the first `N` connect attempts before succeeding, to exercise
/// the engine's reconnect-with-backoff path.
pub struct MockAdapter {
    script: VecDeque<Vec<Mutation>>,
    connect_failures_remaining: usize,
    connected: bool,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            connect_failures_remaining: 0,
            connected: false,
        }
    }

    /// Appends one batch to the script; delivered in order, one per `receive()` call.
    pub fn push_batch(&mut self, batch: Vec<Mutation>) -> &mut Self {
        self.script.push_back(batch);
        self
    }

    /// Makes the next `n` `connect()` calls fail before a connect succeeds.
    pub fn fail_connects(&mut self, n: usize) -> &mut Self {
        self.connect_failures_remaining = n;
        self
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeAdapter for MockAdapter {
    async fn connect(&mut self, _timeout: Duration) -> Result<()> {
        if self.connect_failures_remaining > 0 {
            self.connect_failures_remaining -= 1;
            bail!("scripted connect failure");
        }
        self.connected = true;
        Ok(())
    }

    async fn subscribe(&mut self, _markets: &[MarketKey]) -> Result<()> {
        if !self.connected {
            bail!("subscribe called before connect");
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Vec<Mutation>>> {
        match self.script.pop_front() {
            Some(batch) => Ok(Some(batch)),
            None => {
                // Script exhausted: behave like an idle, still-open connection rather
                // than signal a close, so tests control shutdown explicitly.
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }
}
