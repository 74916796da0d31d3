//! Kraken exchange clients
//!
//! - [`websocket::KrakenWebsocket`]: live trade subscription on the v2
//!   websocket API
//! - [`rest::KrakenRestClient`]: historical backfill over the public
//!   Trades REST endpoint

pub mod rest;
pub mod websocket;

pub use rest::KrakenRestClient;
pub use websocket::KrakenWebsocket;
