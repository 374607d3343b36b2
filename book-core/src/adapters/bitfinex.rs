//! Bitfinex `wss://api.bitfinex.com/ws/2` book channel adapter.
//!
//! Wire shape: a dict-valued `event` frame for the subscribe handshake, then
//! list-valued frames keyed by channel id - `[chanId, "hb"]` for heartbeats,
//! `[chanId, [[rate, count, amount], ...]]` for the initial snapshot, and
//! `[chanId, rate, count, amount]` for a single incremental update.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::data::{MarketKey, Mutation};
use crate::engine::ExchangeAdapter;

const ENDPOINT: &str = "wss://api.bitfinex.com/ws/2";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct BitfinexAdapter {
    socket: Option<WsStream>,
    channel_to_market: HashMap<i64, MarketKey>,
}

impl BitfinexAdapter {
    pub fn new() -> Self {
        Self {
            socket: None,
            channel_to_market: HashMap::new(),
        }
    }

    fn socket_mut(&mut self) -> Result<&mut WsStream> {
        self.socket.as_mut().context("not connected")
    }

    fn single_update(market: &MarketKey, rate: f64, count: i64, amount: f64) -> Result<Mutation> {
        if count == 0 {
            // Bitfinex's delete-on-count-zero frame only ever carries ±1 as a side
            // marker, never the resting size; anything else is a protocol violation.
            if amount == 1.0 {
                Ok(Mutation::RemoveBid {
                    market: market.clone(),
                    price: rate,
                })
            } else if amount == -1.0 {
                Ok(Mutation::RemoveAsk {
                    market: market.clone(),
                    price: rate,
                })
            } else {
                bail!("unexpected amount {amount} in delete command (expected +-1)")
            }
        } else if amount > 0.0 {
            Ok(Mutation::UpdateBid {
                market: market.clone(),
                price: rate,
                size: amount,
            })
        } else {
            Ok(Mutation::UpdateAsk {
                market: market.clone(),
                price: rate,
                size: amount.abs(),
            })
        }
    }

    fn process_subscribed(&mut self, frame: &Value) -> Result<()> {
        let pair = frame
            .get("pair")
            .and_then(Value::as_str)
            .context("subscribed event missing pair")?;
        if pair.len() != 6 {
            bail!("unexpected pair {pair}");
        }
        let channel_id = frame
            .get("chanId")
            .and_then(Value::as_i64)
            .context("subscribed event missing chanId")?;

        if self.channel_to_market.contains_key(&channel_id) {
            bail!("channel {channel_id} already defined");
        }

        let market = MarketKey::new(&pair[0..3], &pair[3..6]);
        self.channel_to_market.insert(channel_id, market);
        Ok(())
    }

    fn process_update(&self, frame: &[Value]) -> Result<Vec<Mutation>> {
        let channel_id = frame[0].as_i64().context("invalid channel id")?;
        let market = self
            .channel_to_market
            .get(&channel_id)
            .context("update for unknown channel")?;

        if frame.len() == 2 {
            if frame[1].as_str() == Some("hb") {
                return Ok(vec![Mutation::Heartbeat]);
            }
            if let Some(levels) = frame[1].as_array() {
                let mut mutations = Vec::with_capacity(levels.len());
                for level in levels {
                    let level = level.as_array().context("malformed snapshot level")?;
                    mutations.push(Self::single_update(
                        market,
                        level[0].as_f64().context("rate")?,
                        level[1].as_i64().context("count")?,
                        level[2].as_f64().context("amount")?,
                    )?);
                }
                return Ok(mutations);
            }
            bail!("unexpected two-element update shape");
        }

        if frame.len() == 4 {
            let mutation = Self::single_update(
                market,
                frame[1].as_f64().context("rate")?,
                frame[2].as_i64().context("count")?,
                frame[3].as_f64().context("amount")?,
            )?;
            return Ok(vec![mutation]);
        }

        bail!("unexpected update message length {}", frame.len())
    }
}

impl Default for BitfinexAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeAdapter for BitfinexAdapter {
    async fn connect(&mut self, timeout: Duration) -> Result<()> {
        let (socket, _response) = tokio::time::timeout(timeout, connect_async(ENDPOINT))
            .await
            .context("timed out connecting to bitfinex")?
            .context("failed to connect to bitfinex websocket")?;
        self.socket = Some(socket);
        self.channel_to_market.clear();
        Ok(())
    }

    async fn subscribe(&mut self, markets: &[MarketKey]) -> Result<()> {
        for market in markets {
            let request = serde_json::json!({
                "event": "subscribe",
                "channel": "book",
                "prec": "P0",
                "symbol": format!("t{}{}", market.base.to_uppercase(), market.quote.to_uppercase()),
                "len": "100",
                "freq": "F0",
            });
            self.socket_mut()?
                .send(Message::Text(request.to_string()))
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

        match decoded {
            Value::Object(_) => {
                let event = decoded
                    .get("event")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow!("dict frame without event field"))?;
                match event {
                    "subscribed" => {
                        self.process_subscribed(&decoded)?;
                        Ok(Some(Vec::new()))
                    }
                    "info" => Ok(Some(Vec::new())),
                    other => bail!("unexpected event {other}"),
                }
            }
            Value::Array(items) => {
                debug!(len = items.len(), "bitfinex list frame");
                Ok(Some(self.process_update(&items)?))
            }
            _ => bail!("unexpected message shape"),
        }
    }

    async fn disconnect(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None).await;
        }
        self.channel_to_market.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_update_rejects_non_unit_amount_on_delete() {
        let market = MarketKey::new("eth", "btc");
        let err = BitfinexAdapter::single_update(&market, 0.05, 0, 2.0).unwrap_err();
        assert!(err.to_string().contains("expected"));
    }

    #[test]
    fn single_update_delete_maps_sign_to_side() {
        let market = MarketKey::new("eth", "btc");
        assert!(matches!(
            BitfinexAdapter::single_update(&market, 0.05, 0, 1.0).unwrap(),
            Mutation::RemoveBid { .. }
        ));
        assert!(matches!(
            BitfinexAdapter::single_update(&market, 0.05, 0, -1.0).unwrap(),
            Mutation::RemoveAsk { .. }
        ));
    }

    #[test]
    fn single_update_nonzero_count_maps_sign_to_side() {
        let market = MarketKey::new("eth", "btc");
        match BitfinexAdapter::single_update(&market, 0.05, 1, 2.0).unwrap() {
            Mutation::UpdateBid { size, .. } => assert_eq!(size, 2.0),
            other => panic!("unexpected mutation {other:?}"),
        }
        match BitfinexAdapter::single_update(&market, 0.05, 1, -2.0).unwrap() {
            Mutation::UpdateAsk { size, .. } => assert_eq!(size, 2.0),
            other => panic!("unexpected mutation {other:?}"),
        }
    }

    /// End-to-end: a subscribed event, a three-level snapshot, and one delta against
    /// one of the snapshot's own levels.
    #[test]
    fn snapshot_then_delta_leaves_one_level_per_side() {
        let mut adapter = BitfinexAdapter::new();
        adapter
            .process_subscribed(&serde_json::json!({"event": "subscribed", "pair": "ETHBTC", "chanId": 17}))
            .unwrap();

        let snapshot = serde_json::json!([17, [[0.05, 3, 1.0], [0.06, 2, -2.0], [0.04, 1, 0.5]]]);
        let mutations = adapter.process_update(snapshot.as_array().unwrap()).unwrap();
        assert_eq!(mutations.len(), 3);

        let delta = serde_json::json!([17, 0.05, 0, 1]);
        let mutations = adapter.process_update(delta.as_array().unwrap()).unwrap();
        assert!(matches!(mutations.as_slice(), [Mutation::RemoveBid { .. }]));
    }
}
