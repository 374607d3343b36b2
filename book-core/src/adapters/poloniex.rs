//! Poloniex `wss://api2.poloniex.com` adapter.
//!
//! Wire shape: `[1010]` is a heartbeat; `[marketId, sequence, updates]` carries one
//! batch of updates, each either `["i", {currencyPair, orderBook}]` (snapshot) or
//! `["o", side, rate, amount]` (incremental, `amount == 0` meaning remove). Poloniex
//! is the one exchange in this pack that stamps an explicit per-market sequence
//! number, so this is where I4 continuity is actually enforced.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::data::{MarketKey, Mutation};
use crate::engine::ExchangeAdapter;
use crate::resilience::SequenceTracker;

const ENDPOINT: &str = "wss://api2.poloniex.com";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct PoloniexAdapter {
    socket: Option<WsStream>,
    market_id_to_market: HashMap<i64, MarketKey>,
    sequences: HashMap<i64, SequenceTracker>,
}

impl PoloniexAdapter {
    pub fn new() -> Self {
        Self {
            socket: None,
            market_id_to_market: HashMap::new(),
            sequences: HashMap::new(),
        }
    }

    fn socket_mut(&mut self) -> Result<&mut WsStream> {
        self.socket.as_mut().context("not connected")
    }

    fn process_initialisation(&mut self, market_id: i64, initial: &Value) -> Result<Vec<Mutation>> {
        if self.market_id_to_market.contains_key(&market_id) {
            bail!("market id {market_id} already defined");
        }

        let currency_pair = initial
            .get("currencyPair")
            .and_then(Value::as_str)
            .context("initialisation missing currencyPair")?;
        let mut parts = currency_pair.split('_');
        let quote = parts.next().context("malformed currency pair")?;
        let base = parts.next().context("malformed currency pair")?;

        let market = MarketKey::new(base, quote);
        self.market_id_to_market.insert(market_id, market.clone());

        let order_book = initial
            .get("orderBook")
            .and_then(Value::as_array)
            .context("initialisation missing orderBook")?;
        let asks = order_book.first().and_then(Value::as_object).context("missing asks")?;
        let bids = order_book.get(1).and_then(Value::as_object).context("missing bids")?;

        let mut mutations = Vec::with_capacity(asks.len() + bids.len());
        for (rate, amount) in asks {
            mutations.push(Mutation::UpdateAsk {
                market: market.clone(),
                price: rate.parse().context("invalid ask rate")?,
                size: parse_amount(amount)?,
            });
        }
        for (rate, amount) in bids {
            mutations.push(Mutation::UpdateBid {
                market: market.clone(),
                price: rate.parse().context("invalid bid rate")?,
                size: parse_amount(amount)?,
            });
        }

        Ok(mutations)
    }

    fn process_update(&self, market_id: i64, update: &[Value]) -> Result<Mutation> {
        let market = self
            .market_id_to_market
            .get(&market_id)
            .context("update for unknown market id")?;

        let side = update[0].as_i64().context("invalid update side")?;
        let rate: f64 = update[1].as_str().map(str::parse).transpose()?
            .or_else(|| update[1].as_f64())
            .context("invalid update rate")?;
        let amount: f64 = update[2].as_str().map(str::parse).transpose()?
            .or_else(|| update[2].as_f64())
            .context("invalid update amount")?;

        match side {
            0 if amount == 0.0 => Ok(Mutation::RemoveAsk {
                market: market.clone(),
                price: rate,
            }),
            0 => Ok(Mutation::UpdateAsk {
                market: market.clone(),
                price: rate,
                size: amount,
            }),
            1 if amount == 0.0 => Ok(Mutation::RemoveBid {
                market: market.clone(),
                price: rate,
            }),
            1 => Ok(Mutation::UpdateBid {
                market: market.clone(),
                price: rate,
                size: amount,
            }),
            other => bail!("unexpected update side {other}"),
        }
    }
}

fn parse_amount(value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => s.parse().context("invalid amount string"),
        Value::Number(n) => n.as_f64().context("invalid amount number"),
        other => bail!("unexpected amount shape {other:?}"),
    }
}

impl Default for PoloniexAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeAdapter for PoloniexAdapter {
    async fn connect(&mut self, timeout: Duration) -> Result<()> {
        let (socket, _response) = tokio::time::timeout(timeout, connect_async(ENDPOINT))
            .await
            .context("timed out connecting to poloniex")?
            .context("failed to connect to poloniex websocket")?;
        self.socket = Some(socket);
        self.market_id_to_market.clear();
        self.sequences.clear();
        Ok(())
    }

    async fn subscribe(&mut self, markets: &[MarketKey]) -> Result<()> {
        for market in markets {
            let command = serde_json::json!({
                "command": "subscribe",
                "channel": format!("{}_{}", market.quote.to_uppercase(), market.base.to_uppercase()),
            });
            self.socket_mut()?
                .send(Message::Text(command.to_string()))
                .await
                .context("failed to send subscribe frame")?;
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Vec<Mutation>>> {
        let frame = match self.socket_mut()?.next().await {
            Some(frame) => frame.context("websocket receive failed")?,
            None => return Ok(None),
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => return Ok(None),
            _ => return Ok(Some(Vec::new())),
        };

        let decoded: Value = serde_json::from_str(&text).context("invalid JSON frame")?;
        let items = decoded.as_array().context("frame was not a list")?;

        if items.len() == 1 && items[0].as_i64() == Some(1010) {
            return Ok(Some(vec![Mutation::Heartbeat]));
        }

        if items.len() != 3 {
            return Ok(Some(Vec::new()));
        }

        let market_id = items[0].as_i64().context("invalid market id")?;
        let sequence = items[1].as_i64().context("invalid sequence")?;
        let updates = items[2].as_array().context("updates field was not a list")?;

        let mut mutations = Vec::new();
        for update in updates {
            let update = update.as_array().context("malformed update entry")?;
            match update[0].as_str() {
                Some("i") => mutations.extend(self.process_initialisation(market_id, &update[1])?),
                Some("o") => mutations.push(self.process_update(market_id, &update[1..4])?),
                other => bail!("unexpected update tag {other:?}"),
            }
        }

        let tracker = self.sequences.entry(market_id).or_insert_with(SequenceTracker::new);
        if !tracker.check(sequence as u64) {
            bail!("sequence gap on market id {market_id}: expected continuation of {:?}, got {sequence}",
                tracker.last_sequence());
        }

        Ok(Some(mutations))
    }

    async fn disconnect(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None).await;
        }
        self.market_id_to_market.clear();
        self.sequences.clear();
    }
}
