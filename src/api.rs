//! REST access to the exchange's public market-data endpoints.
//!
//! [`MarketApi`] is the seam the bootstrap and the enrichment scheduler
//! talk to; [`RestClient`] is the `reqwest` implementation. Every call
//! treats a non-success status as an error.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::Result;
use crate::models::candle::Kline;
use crate::models::instrument::ExchangeInfo;
use crate::models::ticker::{Ticker24h, WindowTicker};
use crate::store::Window;

const TICKER_24H_PATH: &str = "/api/v3/ticker/24hr";
const EXCHANGE_INFO_PATH: &str = "/api/v3/exchangeInfo";
const WINDOW_TICKER_PATH: &str = "/api/v3/ticker";
const KLINES_PATH: &str = "/api/v3/klines";

/// Daily bars requested per symbol; enough for the 30d look-back.
pub const DAILY_BAR_LIMIT: u32 = 31;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Public market-data endpoints used by the engine.
///
/// Bootstrap calls take the base URL explicitly because they walk a list
/// of fallback domains; enrichment calls go to the implementation's own
/// primary base.
pub trait MarketApi: Send + Sync + 'static {
    /// 24h statistics for every symbol on `base`.
    fn ticker_24h(&self, base: &str) -> impl Future<Output = Result<Vec<Ticker24h>>> + Send;

    /// Exchange metadata (trading status per symbol) on `base`.
    fn exchange_info(&self, base: &str) -> impl Future<Output = Result<ExchangeInfo>> + Send;

    /// Rolling statistics for one symbol over an hour-scale window.
    fn window_ticker(
        &self,
        symbol: &str,
        window: Window,
    ) -> impl Future<Output = Result<WindowTicker>> + Send;

    /// The most recent `limit` daily bars for one symbol, oldest first.
    fn daily_bars(&self, symbol: &str, limit: u32) -> impl Future<Output = Result<Vec<Kline>>> + Send;
}

/// `reqwest`-backed [`MarketApi`].
#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    primary: String,
}

impl RestClient {
    /// Builds a client whose enrichment calls go to `primary`.
    ///
    /// # Errors
    ///
    /// Returns [`TickerboardError::Http`](crate::TickerboardError::Http) if
    /// the TLS backend cannot be initialised.
    pub fn new(primary: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tickerboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            primary: primary.into(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(%url, ?query, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl MarketApi for RestClient {
    async fn ticker_24h(&self, base: &str) -> Result<Vec<Ticker24h>> {
        self.get_json(format!("{base}{TICKER_24H_PATH}"), &[]).await
    }

    async fn exchange_info(&self, base: &str) -> Result<ExchangeInfo> {
        self.get_json(format!("{base}{EXCHANGE_INFO_PATH}"), &[])
            .await
    }

    async fn window_ticker(&self, symbol: &str, window: Window) -> Result<WindowTicker> {
        self.get_json(
            format!("{}{WINDOW_TICKER_PATH}", self.primary),
            &[
                ("symbol", symbol.to_string()),
                ("windowSize", window.label().to_string()),
            ],
        )
        .await
    }

    async fn daily_bars(&self, symbol: &str, limit: u32) -> Result<Vec<Kline>> {
        self.get_json(
            format!("{}{KLINES_PATH}", self.primary),
            &[
                ("symbol", symbol.to_string()),
                ("interval", "1d".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}
