//! Exchange metadata (`GET /api/v3/exchangeInfo`) models.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Status string of a pair that is open for trading.
pub const TRADING: &str = "TRADING";

/// Top-level exchange metadata response.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

/// Reference data for a single trading pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    /// `TRADING`, `BREAK`, `HALT`, ...
    pub status: String,
    /// Absent from some mirrors.
    #[serde(default)]
    pub quote_asset: Option<String>,
}

impl ExchangeInfo {
    /// Symbols currently open for trading.
    pub fn tradable(&self) -> HashSet<&str> {
        self.symbols
            .iter()
            .filter(|s| s.status == TRADING)
            .map(|s| s.symbol.as_str())
            .collect()
    }

    /// Declared quote asset code per symbol, where the metadata has one.
    pub fn quote_codes(&self) -> HashMap<&str, &str> {
        self.symbols
            .iter()
            .filter_map(|s| Some((s.symbol.as_str(), s.quote_asset.as_deref()?)))
            .collect()
    }
}
