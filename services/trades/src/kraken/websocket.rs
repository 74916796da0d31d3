//! Live trade subscription on the Kraken v2 websocket API

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use services_common::Trade;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::source::{SourceError, TradeSource};

pub const KRAKEN_WS_URL: &str = "wss://ws.kraken.com/v2";

/// Pause before a reconnection attempt after the stream drops
const RECONNECT_DELAY: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    method: &'static str,
    params: SubscribeParams<'a>,
}

#[derive(Debug, Serialize)]
struct SubscribeParams<'a> {
    channel: &'static str,
    symbol: &'a [String],
    snapshot: bool,
}

/// An incoming channel frame; non-trade frames leave `data` unparsable
/// or absent and are skipped
#[derive(Debug, Deserialize)]
struct TradeFrame {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    data: Option<Vec<WsTrade>>,
}

#[derive(Debug, Deserialize)]
struct WsTrade {
    symbol: String,
    price: Decimal,
    qty: Decimal,
    timestamp: DateTime<Utc>,
}

/// Live websocket source
///
/// Subscribes to the `trade` channel for the configured pairs with
/// snapshots disabled. The stream reconnects and resubscribes
/// indefinitely if the connection drops; only the initial subscription
/// failure is fatal.
pub struct KrakenWebsocket {
    stream: WsStream,
    product_ids: Vec<String>,
}

impl KrakenWebsocket {
    /// Connect and subscribe; failure here is fatal to the service
    pub async fn connect(product_ids: Vec<String>) -> Result<Self, SourceError> {
        let stream = Self::establish(&product_ids).await?;
        info!(pairs = ?product_ids, "subscribed to Kraken trade channel");
        Ok(Self {
            stream,
            product_ids,
        })
    }

    async fn establish(product_ids: &[String]) -> Result<WsStream, SourceError> {
        let (mut stream, _response) = connect_async(KRAKEN_WS_URL).await?;

        let request = SubscribeRequest {
            method: "subscribe",
            params: SubscribeParams {
                channel: "trade",
                symbol: product_ids,
                snapshot: false,
            },
        };
        let payload = serde_json::to_string(&request)
            .map_err(|e| SourceError::Subscription(e.to_string()))?;
        stream.send(Message::Text(payload)).await?;

        // The server answers with an acknowledgement and a snapshot
        // message per symbol before trade updates begin.
        for _ in 0..product_ids.len() * 2 {
            match stream.next().await {
                Some(Ok(message)) => debug!(?message, "discarding subscription response"),
                Some(Err(err)) => return Err(SourceError::WebSocket(err)),
                None => {
                    return Err(SourceError::Subscription(
                        "connection closed during subscription".to_string(),
                    ));
                }
            }
        }

        Ok(stream)
    }

    async fn reconnect(&mut self) {
        loop {
            tokio::time::sleep(RECONNECT_DELAY).await;
            match Self::establish(&self.product_ids).await {
                Ok(stream) => {
                    self.stream = stream;
                    info!("websocket reconnected and resubscribed");
                    return;
                }
                Err(err) => error!(%err, "websocket reconnection failed, retrying"),
            }
        }
    }

    /// Parse one text frame into trades
    ///
    /// Heartbeats produce an empty batch; malformed frames are logged and
    /// skipped so the stream never stalls on bad data.
    fn parse_frame(text: &str) -> Vec<Trade> {
        let frame: TradeFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "failed to decode websocket frame, skipping");
                return Vec::new();
            }
        };

        if frame.channel.as_deref() == Some("heartbeat") {
            return Vec::new();
        }

        let Some(data) = frame.data else {
            warn!("frame missing `data` field, skipping");
            return Vec::new();
        };

        data.into_iter()
            .map(|t| Trade::new(t.symbol, t.price, t.qty, t.timestamp.timestamp_millis()))
            .collect()
    }
}

#[async_trait]
impl TradeSource for KrakenWebsocket {
    async fn get_trades(&mut self) -> Result<Vec<Trade>, SourceError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Self::parse_frame(&text)),
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(err) = self.stream.send(Message::Pong(payload)).await {
                        warn!(%err, "failed to answer websocket ping");
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!("websocket closed by server, reconnecting");
                    self.reconnect().await;
                }
                Some(Ok(_)) => {} // binary and pong frames are not used
                Some(Err(err)) => {
                    error!(%err, "websocket read failed, reconnecting");
                    self.reconnect().await;
                }
            }
        }
    }

    fn is_done(&self) -> bool {
        false
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!(%err, "error closing websocket");
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn parses_trade_frame_into_one_trade_per_element() {
        let text = r#"{
            "channel": "trade",
            "type": "update",
            "data": [
                {"symbol":"BTC/USD","side":"buy","price":42000.5,"qty":0.01,
                 "ord_type":"market","trade_id":1,"timestamp":"2024-01-01T00:00:00.000000Z"},
                {"symbol":"BTC/USD","side":"sell","price":41999.0,"qty":0.5,
                 "ord_type":"limit","trade_id":2,"timestamp":"2024-01-01T00:00:01.500000Z"}
            ]
        }"#;

        let trades = KrakenWebsocket::parse_frame(text);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].pair, "BTC/USD");
        assert_eq!(trades[0].price, dec!(42000.5));
        assert_eq!(trades[0].quantity, dec!(0.01));
        assert_eq!(trades[0].timestamp_ms, 1_704_067_200_000);
        assert_eq!(trades[1].timestamp_ms, 1_704_067_201_500);
    }

    #[test]
    fn heartbeat_frames_produce_no_trades() {
        let trades = KrakenWebsocket::parse_frame(r#"{"channel":"heartbeat"}"#);
        assert!(trades.is_empty());
    }

    #[test]
    fn missing_data_field_is_skipped() {
        let trades =
            KrakenWebsocket::parse_frame(r#"{"method":"subscribe","success":true}"#);
        assert!(trades.is_empty());
    }

    #[test]
    fn malformed_json_is_skipped() {
        let trades = KrakenWebsocket::parse_frame("{not json");
        assert!(trades.is_empty());
    }

    #[test]
    fn malformed_trade_elements_skip_the_frame() {
        let text = r#"{"channel":"trade","data":[{"symbol":"BTC/USD"}]}"#;
        let trades = KrakenWebsocket::parse_frame(text);
        assert!(trades.is_empty());
    }
}
