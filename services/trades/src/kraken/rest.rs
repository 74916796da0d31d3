//! Historical trade backfill over the Kraken public REST API
//!
//! Pairs are processed sequentially. Each pair starts from
//! `now - last_n_days` and pages forward through the `result.last`
//! nanosecond cursor until the cursor reaches the present, then the
//! client rotates to the next pair. The source is done once every pair
//! has caught up.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use services_common::Trade;
use tracing::{debug, error, info, warn};

use crate::source::{SourceError, TradeSource};

pub const KRAKEN_REST_URL: &str = "https://api.kraken.com/0/public/Trades";

/// Pause after a TLS/connect failure before retrying the same round
const RETRY_DELAY: Duration = Duration::from_secs(10);
/// Courtesy pause between successive rounds (Kraken public endpoints
/// allow roughly one request per second)
const ROUND_PAUSE: Duration = Duration::from_secs(1);

const NANOS_PER_SEC: i64 = 1_000_000_000;
const SECS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Deserialize)]
struct TradesResponse {
    #[serde(default)]
    error: Vec<Value>,
    #[serde(default)]
    result: serde_json::Map<String, Value>,
}

/// Historical REST source
pub struct KrakenRestClient {
    http: reqwest::Client,
    base_url: String,
    product_ids: Vec<String>,
    current_index: usize,
    since_ns: i64,
    original_since_ns: i64,
    done: bool,
    round_pause: Duration,
}

impl KrakenRestClient {
    pub fn new(product_ids: Vec<String>, last_n_days: u32) -> Self {
        let now = now_ns();
        Self::with_base_url(KRAKEN_REST_URL, product_ids, last_n_days, now)
    }

    /// Build a client against an arbitrary endpoint (tests run against a
    /// local mock server); `now_ns` anchors the backfill window
    pub fn with_base_url(
        base_url: &str,
        product_ids: Vec<String>,
        last_n_days: u32,
        now_ns: i64,
    ) -> Self {
        let since_ns = now_ns - i64::from(last_n_days) * SECS_PER_DAY * NANOS_PER_SEC;
        let done = product_ids.is_empty();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            product_ids,
            current_index: 0,
            since_ns,
            original_since_ns: since_ns,
            done,
            round_pause: if base_url == KRAKEN_REST_URL {
                ROUND_PAUSE
            } else {
                Duration::ZERO
            },
        }
    }

    fn current_pair(&self) -> Option<&str> {
        self.product_ids.get(self.current_index).map(String::as_str)
    }

    /// Move the cursor forward; rotate to the next pair once the cursor
    /// is within one second of `now`
    fn advance_cursor(&mut self, last_ns: i64, now_ns: i64) {
        self.since_ns = last_ns;
        if self.since_ns > now_ns - NANOS_PER_SEC {
            self.next_pair();
        }
    }

    fn next_pair(&mut self) {
        self.current_index += 1;
        if self.current_index >= self.product_ids.len() {
            self.done = true;
            info!("finished backfill for all pairs");
        } else {
            self.since_ns = self.original_since_ns;
            info!(pair = %self.product_ids[self.current_index], "moving to next pair");
        }
    }

    /// Convert raw `[price, qty, time_sec, ...]` rows into trades,
    /// skipping rows that fail to parse
    fn parse_rows(pair: &str, rows: &[Value]) -> Vec<Trade> {
        rows.iter()
            .filter_map(|row| match Self::parse_row(pair, row) {
                Some(trade) => Some(trade),
                None => {
                    warn!(pair, ?row, "skipping malformed trade row");
                    None
                }
            })
            .collect()
    }

    fn parse_row(pair: &str, row: &Value) -> Option<Trade> {
        let fields = row.as_array()?;
        let price: Decimal = serde_json::from_value(fields.first()?.clone()).ok()?;
        let quantity: Decimal = serde_json::from_value(fields.get(1)?.clone()).ok()?;
        let timestamp_sec = fields.get(2)?.as_f64()?;
        let timestamp_ms = (timestamp_sec * 1000.0).round() as i64;
        Some(Trade::new(pair, price, quantity, timestamp_ms))
    }

    fn parse_cursor(result: &serde_json::Map<String, Value>) -> Option<i64> {
        let last = result.get("last")?.as_str()?;
        last.parse::<i64>()
            .ok()
            .or_else(|| last.parse::<f64>().ok().map(|v| v as i64))
    }
}

#[async_trait]
impl TradeSource for KrakenRestClient {
    /// One request round for the current pair
    ///
    /// Transport failures never escape: TLS/connect errors pause and
    /// retry at the next round, everything else skips the round with an
    /// empty batch.
    async fn get_trades(&mut self) -> Result<Vec<Trade>, SourceError> {
        let Some(pair) = self.current_pair().map(str::to_string) else {
            return Ok(Vec::new());
        };
        if self.done {
            return Ok(Vec::new());
        }

        let response = match self
            .http
            .get(&self.base_url)
            .header("Accept", "application/json")
            .query(&[("pair", pair.as_str()), ("since", &self.since_ns.to_string())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(err) if err.is_connect() || err.is_timeout() => {
                error!(%err, "connection to Kraken API failed, pausing before retry");
                tokio::time::sleep(RETRY_DELAY).await;
                return Ok(Vec::new());
            }
            Err(err) => {
                error!(%err, "request to Kraken API failed, skipping round");
                return Ok(Vec::new());
            }
        };

        let body: TradesResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                error!(%err, "failed to parse Kraken response, skipping round");
                return Ok(Vec::new());
            }
        };

        if !body.error.is_empty() {
            error!(error = ?body.error, "Kraken API returned an error, skipping round");
            return Ok(Vec::new());
        }

        let Some(rows) = body.result.get(&pair).and_then(Value::as_array) else {
            error!(%pair, "response missing trades for pair, skipping round");
            return Ok(Vec::new());
        };

        let trades = Self::parse_rows(&pair, rows);
        debug!(%pair, count = trades.len(), since_ns = self.since_ns, "fetched trade page");

        match Self::parse_cursor(&body.result) {
            Some(last_ns) => self.advance_cursor(last_ns, now_ns()),
            None => warn!(%pair, "response missing `last` cursor, repeating round"),
        }

        if !self.round_pause.is_zero() {
            tokio::time::sleep(self.round_pause).await;
        }

        Ok(trades)
    }

    fn is_done(&self) -> bool {
        self.done
    }

    async fn close(&mut self) {}
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    const NOW_NS: i64 = 1_700_000_000 * NANOS_PER_SEC;

    fn client(pairs: &[&str]) -> KrakenRestClient {
        KrakenRestClient::with_base_url(
            "http://localhost:0",
            pairs.iter().map(|s| s.to_string()).collect(),
            1,
            NOW_NS,
        )
    }

    #[test]
    fn backfill_window_starts_last_n_days_ago() {
        let c = client(&["BTC/USD"]);
        assert_eq!(c.since_ns, NOW_NS - SECS_PER_DAY * NANOS_PER_SEC);
    }

    #[test]
    fn cursor_advances_within_a_pair() {
        let mut c = client(&["BTC/USD", "ETH/USD"]);
        let mid_ns = NOW_NS - 3600 * NANOS_PER_SEC;
        c.advance_cursor(mid_ns, NOW_NS);
        assert_eq!(c.since_ns, mid_ns);
        assert_eq!(c.current_pair(), Some("BTC/USD"));
        assert!(!c.is_done());
    }

    #[test]
    fn pair_rotation_resets_the_cursor() {
        let mut c = client(&["BTC/USD", "ETH/USD"]);
        c.advance_cursor(NOW_NS, NOW_NS);
        assert_eq!(c.current_pair(), Some("ETH/USD"));
        assert_eq!(c.since_ns, c.original_since_ns);
        assert!(!c.is_done());
    }

    #[test]
    fn source_is_done_after_the_last_pair_catches_up() {
        let mut c = client(&["BTC/USD"]);
        c.advance_cursor(NOW_NS, NOW_NS);
        assert!(c.is_done());
    }

    #[test]
    fn empty_pair_list_is_done_immediately() {
        let c = client(&[]);
        assert!(c.is_done());
    }

    #[test]
    fn parses_rows_and_skips_malformed_ones() {
        let rows = vec![
            serde_json::json!(["30243.4", "0.001", 1688669597.8, "b", "m", "", 123]),
            serde_json::json!(["not-a-price", "0.001", 1688669598.0, "s", "l", "", 124]),
            serde_json::json!(["30244.0", "0.5", 1688669599.5, "s", "l", "", 125]),
        ];
        let trades = KrakenRestClient::parse_rows("BTC/USD", &rows);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, dec!(30243.4));
        assert_eq!(trades[0].quantity, dec!(0.001));
        assert_eq!(trades[0].timestamp_ms, 1_688_669_597_800);
        assert_eq!(trades[1].timestamp_ms, 1_688_669_599_500);
    }

    #[test]
    fn parses_nanosecond_cursor_strings() {
        let mut result = serde_json::Map::new();
        result.insert("last".into(), Value::String("1688671200000000000".into()));
        assert_eq!(
            KrakenRestClient::parse_cursor(&result),
            Some(1_688_671_200_000_000_000)
        );
    }
}
