//! Ticker statistics as served by the REST API and the push streams.

use serde::Deserialize;

use super::decimal;

/// One row of `GET /api/v3/ticker/24hr`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    #[serde(deserialize_with = "decimal")]
    pub last_price: f64,
    #[serde(deserialize_with = "decimal")]
    pub price_change_percent: f64,
    /// Turnover in the quote asset.
    #[serde(deserialize_with = "decimal")]
    pub quote_volume: f64,
    /// Number of trades in the window; zero for pairs that never traded.
    pub count: u64,
}

/// Response of `GET /api/v3/ticker?symbol=..&windowSize=..`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowTicker {
    pub symbol: String,
    #[serde(deserialize_with = "decimal")]
    pub price_change_percent: f64,
    #[serde(deserialize_with = "decimal")]
    pub last_price: f64,
}

/// A ticker record pushed on `!ticker@arr` or one of the window streams.
///
/// The push channel uses one-letter keys; only the fields the board keeps
/// are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamTicker {
    /// Event type, e.g. `24hrTicker` or `1hTicker`.
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c", deserialize_with = "decimal")]
    pub last_price: f64,
    #[serde(rename = "P", deserialize_with = "decimal")]
    pub price_change_percent: f64,
    #[serde(rename = "q", deserialize_with = "decimal")]
    pub quote_volume: f64,
}
