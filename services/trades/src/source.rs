//! The trade-source capability shared by both ingestion variants

use async_trait::async_trait;
use services_common::Trade;
use thiserror::Error;

/// Errors surfaced by a trade source
///
/// Transient transport failures are handled inside the sources (retry
/// with backoff); what escapes here is either fatal setup failure or a
/// terminated stream.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("subscription failed: {0}")]
    Subscription(String),
}

/// A source of normalized trades
///
/// The driver loop is identical for both variants: poll `get_trades`
/// until `is_done`, then close.
#[async_trait]
pub trait TradeSource: Send {
    /// Fetch the next batch of trades; an empty batch is not an error
    async fn get_trades(&mut self) -> Result<Vec<Trade>, SourceError>;

    /// Whether the source has exhausted its input (always false for live)
    fn is_done(&self) -> bool;

    /// Release the underlying connection
    async fn close(&mut self);
}
