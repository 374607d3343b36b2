//! The generic supervisor loop: connect, subscribe, receive, decode, apply, verify,
//! restart. Exchange-specific behavior lives entirely behind [`ExchangeAdapter`]; this
//! module never speaks Bitfinex or Poloniex JSON directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::core::{BookError, OutOfSyncError, ReplicaError};
use crate::data::{MarketKey, MarketStatus, Mutation};
use crate::engine::traits::ExchangeAdapter;
use crate::orderbook::MarketState;
use crate::resilience::{HeartbeatMonitor, ReconnectBackoff};

type DataStore = HashMap<MarketKey, MarketState>;

/// Sequence continuity (I4) is checked inside each adapter, which sees the raw
/// per-frame sequence number before translating it into [`Mutation`]s; a gap there
/// surfaces as an `Err` from [`ExchangeAdapter::receive`], which this loop treats like
/// any other transport fault.
///
/// Heartbeat freshness is a single process-wide watchdog, not one per market: any
/// applied mutation on any configured market refreshes it, mirroring a connection that
/// carries several markets over one socket and one heartbeat cadence.
#[derive(Clone)]
pub struct Engine {
    data_store: Arc<RwLock<DataStore>>,
    heartbeat: Arc<RwLock<HeartbeatMonitor>>,
    running: Arc<AtomicBool>,
    restart: Arc<AtomicBool>,
    markets: Arc<Vec<MarketKey>>,
    /// Window used by a query that doesn't pass its own `heartbeat_window`.
    default_heartbeat_window: Duration,
}

impl Engine {
    /// Spawns the supervisor loop on the current Tokio runtime and returns a handle
    /// that can be queried from any thread. The task keeps running until
    /// [`Engine::shutdown`] is called.
    pub fn spawn<A>(config: EngineConfig, adapter: A) -> Self
    where
        A: ExchangeAdapter + 'static,
    {
        let mut data_store = HashMap::new();
        for market in &config.markets {
            data_store.insert(market.clone(), MarketState::new());
        }

        let engine = Engine {
            data_store: Arc::new(RwLock::new(data_store)),
            heartbeat: Arc::new(RwLock::new(HeartbeatMonitor::new())),
            running: Arc::new(AtomicBool::new(true)),
            restart: Arc::new(AtomicBool::new(false)),
            markets: Arc::new(config.markets.clone()),
            default_heartbeat_window: config.heartbeat_window,
        };

        let supervisor = engine.clone();
        tokio::spawn(async move {
            supervisor.supervisor_loop(config, adapter).await;
        });

        engine
    }

    async fn supervisor_loop<A: ExchangeAdapter>(&self, config: EngineConfig, mut adapter: A) {
        let mut backoff = ReconnectBackoff::new();

        while self.running.load(Ordering::SeqCst) {
            self.restart.store(false, Ordering::SeqCst);
            self.reset_all_markets();

            if !self.connect_with_backoff(&mut adapter, &config, &mut backoff).await {
                self.running.store(false, Ordering::SeqCst);
                break;
            }

            if let Err(err) = adapter.subscribe(&self.markets).await {
                warn!(error = %err, "subscribe failed, reconnecting");
                adapter.disconnect().await;
                continue;
            }

            self.mark_subscribed();
            info!(exchange = ?config.exchange, markets = ?self.markets, "subscribed, entering receive loop");
            self.receive_loop(&mut adapter).await;

            adapter.disconnect().await;
            if self.running.load(Ordering::SeqCst) {
                info!(exchange = ?config.exchange, "restart requested, reconnecting");
            }
        }

        info!("supervisor loop stopped");
    }

    async fn connect_with_backoff<A: ExchangeAdapter>(
        &self,
        adapter: &mut A,
        config: &EngineConfig,
        backoff: &mut ReconnectBackoff,
    ) -> bool {
        backoff.reset();
        loop {
            match adapter.connect(config.transport_timeout).await {
                Ok(()) => {
                    info!(attempt = backoff.attempt_number(), "connected");
                    return true;
                }
                Err(err) => {
                    warn!(error = %err, attempt = backoff.attempt_number(), "connect failed");
                    match backoff.next_delay() {
                        Some(delay) if !delay.is_zero() => tokio::time::sleep(delay).await,
                        Some(_) => {}
                        None => {
                            warn!("exhausted reconnect attempts, giving up");
                            return false;
                        }
                    }
                }
            }
        }
    }

    async fn receive_loop<A: ExchangeAdapter>(&self, adapter: &mut A) {
        while self.running.load(Ordering::SeqCst) && !self.restart.load(Ordering::SeqCst) {
            match adapter.receive().await {
                Ok(Some(batch)) => self.apply_batch(batch),
                Ok(None) => {
                    info!("connection closed cleanly");
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "receive failed");
                    return;
                }
            }
        }
    }

    /// Marks every configured market `Initialising` once the subscribe handshake
    /// completes, so the first applied batch can promote it to `Active`.
    fn mark_subscribed(&self) {
        let mut data_store = self.data_store.write();
        for market in self.markets.iter() {
            if let Some(state) = data_store.get_mut(market) {
                state.status = MarketStatus::Initialising;
            }
        }
    }

    fn reset_all_markets(&self) {
        let mut data_store = self.data_store.write();
        for market in self.markets.iter() {
            if let Some(state) = data_store.get_mut(market) {
                state.reset();
            }
        }
        self.heartbeat.write().reset();
    }

    /// Applies one decoded frame's worth of mutations under a single write-lock
    /// acquisition, so readers never observe a half-applied batch. Neither adapter in
    /// this crate declares a soft-delete-tolerant mode, so a remove against an absent
    /// price is always treated as a delete-miss and requests a restart.
    fn apply_batch(&self, batch: Vec<Mutation>) {
        if batch.is_empty() {
            return;
        }

        let mut data_store = self.data_store.write();
        let mut touched = Vec::new();

        for mutation in &batch {
            match mutation {
                Mutation::Heartbeat => {}
                Mutation::UpdateAsk { market, price, size } => {
                    if let Some(state) = data_store.get_mut(market) {
                        state.asks.upsert(*price, *size);
                        touched.push(market.clone());
                    }
                }
                Mutation::UpdateBid { market, price, size } => {
                    if let Some(state) = data_store.get_mut(market) {
                        state.bids.upsert(*price, *size);
                        touched.push(market.clone());
                    }
                }
                Mutation::RemoveAsk { market, price } => {
                    if let Some(state) = data_store.get_mut(market) {
                        if !state.asks.remove(*price) {
                            warn!(%market, price, "remove-ask miss (already absent), requesting restart");
                            self.restart.store(true, Ordering::SeqCst);
                        }
                        touched.push(market.clone());
                    }
                }
                Mutation::RemoveBid { market, price } => {
                    if let Some(state) = data_store.get_mut(market) {
                        if !state.bids.remove(*price) {
                            warn!(%market, price, "remove-bid miss (already absent), requesting restart");
                            self.restart.store(true, Ordering::SeqCst);
                        }
                        touched.push(market.clone());
                    }
                }
            }
        }

        self.heartbeat.write().mark_seen();

        for market in touched {
            if let Some(state) = data_store.get_mut(&market) {
                if state.status == MarketStatus::Initialising {
                    state.status = MarketStatus::Active;
                }
            }
        }
    }

    /// Requests a clean restart of the connect/subscribe/receive loop.
    pub fn request_restart(&self) {
        self.restart.store(true, Ordering::SeqCst);
    }

    /// Stops the supervisor loop permanently.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.restart.store(true, Ordering::SeqCst);
    }

    fn verify_status(&self, market: &MarketKey, heartbeat_window: Duration) -> Result<(), ReplicaError> {
        // 1. the market must be one this engine was configured with. This is a structural
        // usage error, not a transient one, so it takes priority over the restart flag below -
        // otherwise an unknown pair queried during a pending restart would be misreported as
        // out-of-sync instead of a plain usage error.
        if !self.markets.iter().any(|m| m == market) {
            return Err(BookError::UnknownPair {
                base: market.base.clone(),
                quote: market.quote.clone(),
            }
            .into());
        }

        // 2. a restart is in flight: nothing downstream can be trusted yet.
        if self.restart.load(Ordering::SeqCst) {
            return Err(OutOfSyncError::RestartInitialised.into());
        }

        // 3. the market must have a replica entry at all.
        let data_store = self.data_store.read();
        let state = data_store
            .get(market)
            .ok_or(OutOfSyncError::Initialising)?;

        // 4. the replica must have absorbed its snapshot.
        if state.status != MarketStatus::Active {
            return Err(OutOfSyncError::NotActive {
                base: market.base.clone(),
                quote: market.quote.clone(),
            }
            .into());
        }

        // 5. the feed (shared across every market on this connection) must be fresh.
        let heartbeat = self.heartbeat.read();
        if let Some(age) = heartbeat.age() {
            if !heartbeat.is_fresh(heartbeat_window) {
                return Err(OutOfSyncError::Stale {
                    base: market.base.clone(),
                    quote: market.quote.clone(),
                    age_secs: age.as_secs(),
                }
                .into());
            }
        }

        // 6. the two ladders must not have crossed.
        if state.is_crossed() {
            self.restart.store(true, Ordering::SeqCst);
            return Err(OutOfSyncError::Inconsistent {
                base: market.base.clone(),
                quote: market.quote.clone(),
            }
            .into());
        }

        Ok(())
    }

    fn validate_depth(n: usize) -> Result<(), ReplicaError> {
        if (1..=5000).contains(&n) {
            Ok(())
        } else {
            Err(BookError::InvalidArgument {
                reason: "n must be between 1 and 5000".to_string(),
            }
            .into())
        }
    }

    fn resolve_window(&self, heartbeat_window: Option<Duration>) -> Duration {
        heartbeat_window.unwrap_or(self.default_heartbeat_window)
    }

    /// Top `n` ask levels, best first. `heartbeat_window` overrides the engine's
    /// default staleness window (§4.7) for this call only; `None` falls back to the
    /// window the engine was configured with (10s by default).
    pub fn top_asks(
        &self,
        market: &MarketKey,
        n: usize,
        heartbeat_window: Option<Duration>,
    ) -> Result<Vec<(f64, f64)>, ReplicaError> {
        Self::validate_depth(n)?;
        self.verify_status(market, self.resolve_window(heartbeat_window))?;
        let data_store = self.data_store.read();
        Ok(data_store[market].asks.top(n))
    }

    /// Top `n` bid levels, best first.
    pub fn top_bids(
        &self,
        market: &MarketKey,
        n: usize,
        heartbeat_window: Option<Duration>,
    ) -> Result<Vec<(f64, f64)>, ReplicaError> {
        Self::validate_depth(n)?;
        self.verify_status(market, self.resolve_window(heartbeat_window))?;
        let data_store = self.data_store.read();
        Ok(data_store[market].bids.top(n))
    }

    /// `(best_bid + best_ask) / 2`.
    pub fn middle(&self, market: &MarketKey, heartbeat_window: Option<Duration>) -> Result<f64, ReplicaError> {
        self.verify_status(market, self.resolve_window(heartbeat_window))?;
        let data_store = self.data_store.read();
        data_store[market].mid_price().ok_or_else(|| {
            OutOfSyncError::NotActive {
                base: market.base.clone(),
                quote: market.quote.clone(),
            }
            .into()
        })
    }

    /// Size resting on the ask side at exactly `price` (0 if absent).
    pub fn ask_depth_at(
        &self,
        market: &MarketKey,
        price: f64,
        heartbeat_window: Option<Duration>,
    ) -> Result<f64, ReplicaError> {
        self.verify_status(market, self.resolve_window(heartbeat_window))?;
        let data_store = self.data_store.read();
        Ok(data_store[market].asks.depth_at(price))
    }

    /// Size resting on the bid side at exactly `price` (0 if absent).
    pub fn bid_depth_at(
        &self,
        market: &MarketKey,
        price: f64,
        heartbeat_window: Option<Duration>,
    ) -> Result<f64, ReplicaError> {
        self.verify_status(market, self.resolve_window(heartbeat_window))?;
        let data_store = self.data_store.read();
        Ok(data_store[market].bids.depth_at(price))
    }

    /// True once every configured market's replica has absorbed its initial snapshot.
    pub fn initialisation_completed(&self) -> bool {
        let data_store = self.data_store.read();
        if data_store.is_empty() {
            return false;
        }
        self.markets.iter().all(|market| {
            data_store
                .get(market)
                .map(|s| s.status == MarketStatus::Active)
                .unwrap_or(false)
        })
    }

    /// Blocks, polling every 100 ms, until every configured market is active.
    pub async fn complete_initialisation(&self) -> bool {
        loop {
            if self.initialisation_completed() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
