//! Shared test utilities: an in-memory [`MarketApi`] and model builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;

use tickerboard::api::MarketApi;
use tickerboard::models::candle::Kline;
use tickerboard::models::instrument::{ExchangeInfo, SymbolInfo};
use tickerboard::models::ticker::{Ticker24h, WindowTicker};
use tickerboard::store::Window;
use tickerboard::{Result, TickerboardError};

/// A request the fake received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Ticker24h(String),
    ExchangeInfo(String),
    WindowTicker(String, Window),
    DailyBars(String),
}

/// Scripted [`MarketApi`]. Anything not scripted fails.
#[derive(Default)]
pub struct FakeApi {
    tickers: HashMap<String, Vec<Ticker24h>>,
    infos: HashMap<String, ExchangeInfo>,
    windows: HashMap<(String, Window), f64>,
    bars: HashMap<String, Vec<Kline>>,
    bootstrap_delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both bootstrap calls succeed on `base`.
    pub fn with_domain(self, base: &str, rows: Vec<Ticker24h>, info: ExchangeInfo) -> Self {
        self.with_tickers(base, rows).with_info(base, info)
    }

    pub fn with_tickers(mut self, base: &str, rows: Vec<Ticker24h>) -> Self {
        self.tickers.insert(base.to_string(), rows);
        self
    }

    pub fn with_info(mut self, base: &str, info: ExchangeInfo) -> Self {
        self.infos.insert(base.to_string(), info);
        self
    }

    pub fn with_window(mut self, symbol: &str, window: Window, change: f64) -> Self {
        self.windows.insert((symbol.to_string(), window), change);
        self
    }

    /// Daily closes for `symbol`, oldest first.
    pub fn with_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, close)| Kline {
                open_time: i as i64 * 86_400_000,
                close: *close,
            })
            .collect();
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    /// Delays every bootstrap call.
    pub fn with_bootstrap_delay(mut self, delay: Duration) -> Self {
        self.bootstrap_delay = Some(delay);
        self
    }

    /// Holds every enrichment call until the semaphore has permits.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of enrichment calls made for `symbol`.
    pub fn enrichment_calls_for(&self, symbol: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| match c {
                Call::WindowTicker(s, _) | Call::DailyBars(s) => s == symbol,
                _ => false,
            })
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn bootstrap_wait(&self) {
        if let Some(delay) = self.bootstrap_delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn enrichment_wait(&self) {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
    }
}

fn unavailable(what: &str) -> TickerboardError {
    TickerboardError::Io(format!("{what} unavailable"))
}

impl MarketApi for FakeApi {
    async fn ticker_24h(&self, base: &str) -> Result<Vec<Ticker24h>> {
        self.record(Call::Ticker24h(base.to_string()));
        self.bootstrap_wait().await;
        self.tickers
            .get(base)
            .cloned()
            .ok_or_else(|| unavailable(base))
    }

    async fn exchange_info(&self, base: &str) -> Result<ExchangeInfo> {
        self.record(Call::ExchangeInfo(base.to_string()));
        self.bootstrap_wait().await;
        self.infos.get(base).cloned().ok_or_else(|| unavailable(base))
    }

    async fn window_ticker(&self, symbol: &str, window: Window) -> Result<WindowTicker> {
        self.record(Call::WindowTicker(symbol.to_string(), window));
        self.enrichment_wait().await;
        let change = self
            .windows
            .get(&(symbol.to_string(), window))
            .copied()
            .ok_or_else(|| unavailable(symbol))?;
        Ok(WindowTicker {
            symbol: symbol.to_string(),
            price_change_percent: change,
            last_price: 0.0,
        })
    }

    async fn daily_bars(&self, symbol: &str, _limit: u32) -> Result<Vec<Kline>> {
        self.record(Call::DailyBars(symbol.to_string()));
        self.enrichment_wait().await;
        self.bars.get(symbol).cloned().ok_or_else(|| unavailable(symbol))
    }
}

/// A 24h row with a non-zero trade count.
pub fn ticker(symbol: &str, price: f64, volume: f64) -> Ticker24h {
    Ticker24h {
        symbol: symbol.to_string(),
        last_price: price,
        price_change_percent: 0.0,
        quote_volume: volume,
        count: 100,
    }
}

/// Exchange metadata listing `symbols` as trading.
pub fn trading(symbols: &[&str]) -> ExchangeInfo {
    ExchangeInfo {
        symbols: symbols
            .iter()
            .map(|s| SymbolInfo {
                symbol: s.to_string(),
                status: "TRADING".to_string(),
                quote_asset: None,
            })
            .collect(),
    }
}

/// Yields to the runtime until spawned tasks have had a chance to run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
