//! Authoritative in-memory ticker state.
//!
//! [`TickerStore`] merges three independent sources (the bootstrap
//! snapshot, push-channel deltas and enrichment fetches) into one map of
//! [`TickerRecord`]s. Every mutating call publishes exactly one
//! [`MarketSnapshot`] through the [`NotificationBus`]; the snapshot is an
//! independent copy behind an `Arc`, so consumers can never reach the
//! store's own map.
//!
//! The store is not `Sync`-shared. It is owned by a single task (see
//! [`handle`]) that applies commands in arrival order.

pub mod handle;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::bus::NotificationBus;
use crate::models::instrument::ExchangeInfo;
use crate::models::ticker::Ticker24h;
use crate::symbol::{QuoteAsset, quote_asset};

pub use handle::{StoreCommand, StoreHandle, spawn_store};

/// Optional change windows that are not carried by the 24h push stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Window {
    H1,
    H4,
    D7,
    D30,
}

impl Window {
    pub const ALL: [Window; 4] = [Window::H1, Window::H4, Window::D7, Window::D30];

    /// Returns the display and config label (`1h`, `4h`, `7d`, `30d`).
    pub fn label(&self) -> &'static str {
        match self {
            Window::H1 => "1h",
            Window::H4 => "4h",
            Window::D7 => "7d",
            Window::D30 => "30d",
        }
    }

    /// Parses a label produced by [`Window::label`].
    pub fn from_label(label: &str) -> Option<Window> {
        Window::ALL
            .into_iter()
            .find(|w| w.label().eq_ignore_ascii_case(label))
    }

    /// Day-scale windows are derived from daily bars; returns the look-back.
    pub fn days(&self) -> Option<usize> {
        match self {
            Window::H1 | Window::H4 => None,
            Window::D7 => Some(7),
            Window::D30 => Some(30),
        }
    }
}

/// One row of market state.
#[derive(Clone, Debug, PartialEq)]
pub struct TickerRecord {
    pub symbol: String,
    pub price: f64,
    /// Rolling 24h turnover in the quote asset.
    pub volume: f64,
    pub change_24h: f64,
    pub change_1h: Option<f64>,
    pub change_4h: Option<f64>,
    pub change_7d: Option<f64>,
    pub change_30d: Option<f64>,
    pub quote: Option<QuoteAsset>,
}

impl TickerRecord {
    /// A zero-valued record with every optional field unknown.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: 0.0,
            volume: 0.0,
            change_24h: 0.0,
            change_1h: None,
            change_4h: None,
            change_7d: None,
            change_30d: None,
            quote: quote_asset(symbol),
        }
    }

    /// Returns the change for `window`, if known.
    pub fn change(&self, window: Window) -> Option<f64> {
        match window {
            Window::H1 => self.change_1h,
            Window::H4 => self.change_4h,
            Window::D7 => self.change_7d,
            Window::D30 => self.change_30d,
        }
    }

    fn change_mut(&mut self, window: Window) -> &mut Option<f64> {
        match window {
            Window::H1 => &mut self.change_1h,
            Window::H4 => &mut self.change_4h,
            Window::D7 => &mut self.change_7d,
            Window::D30 => &mut self.change_30d,
        }
    }

    /// Windows from `tracked` whose value is still unknown.
    pub fn missing(&self, tracked: &[Window]) -> Vec<Window> {
        tracked
            .iter()
            .copied()
            .filter(|w| self.change(*w).is_none())
            .collect()
    }
}

/// Fields carried by one push-channel update. Absent fields are left as is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickerDelta {
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub change_24h: Option<f64>,
}

/// Optional fields produced by one enrichment fetch (or a window stream).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Enrichment {
    fields: Vec<(Window, f64)>,
}

impl Enrichment {
    /// An enrichment carrying a single window's value.
    pub fn single(window: Window, value: f64) -> Self {
        Self {
            fields: vec![(window, value)],
        }
    }

    /// Adds a window value; a later value for the same window wins.
    pub fn with(mut self, window: Window, value: f64) -> Self {
        self.fields.retain(|(w, _)| *w != window);
        self.fields.push((window, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[(Window, f64)] {
        &self.fields
    }
}

/// Symbol → record map as seen by consumers.
pub type TickerMap = HashMap<String, TickerRecord>;

/// An immutable, published view of the store.
#[derive(Clone, Debug, Default)]
pub struct MarketSnapshot {
    /// Incremented on every publish.
    pub version: u64,
    /// `true` once the bootstrap finished or its time ceiling passed.
    pub loaded: bool,
    pub records: TickerMap,
}

/// Single-writer owner of the ticker map.
pub struct TickerStore {
    records: TickerMap,
    version: u64,
    loaded: bool,
    bus: NotificationBus,
}

impl TickerStore {
    /// Creates an empty store publishing on `bus`.
    pub fn new(bus: NotificationBus) -> Self {
        Self {
            records: HashMap::new(),
            version: 0,
            loaded: false,
            bus,
        }
    }

    /// Seeds records from the bootstrap snapshot.
    ///
    /// Only symbols that the exchange metadata lists as trading and that
    /// have a non-zero trade count are taken. Existing records keep their
    /// optional fields; records not in `rows` are left alone. Marks the
    /// store loaded. Returns the number of rows taken.
    pub fn apply_snapshot(&mut self, rows: Vec<Ticker24h>, info: &ExchangeInfo) -> usize {
        let tradable = info.tradable();
        let quotes = info.quote_codes();
        let mut taken = 0;

        for row in rows {
            if row.count == 0 || !tradable.contains(row.symbol.as_str()) {
                continue;
            }
            let record = self
                .records
                .entry(row.symbol.clone())
                .or_insert_with(|| TickerRecord::placeholder(&row.symbol));
            record.price = row.last_price;
            record.volume = row.quote_volume;
            record.change_24h = row.price_change_percent;
            if let Some(quote) = quotes
                .get(row.symbol.as_str())
                .and_then(|code| QuoteAsset::from_code(code))
            {
                record.quote = Some(quote);
            }
            taken += 1;
        }

        self.loaded = true;
        debug!(taken, total = self.records.len(), "Applied bootstrap snapshot");
        self.publish();
        taken
    }

    /// Merges one push-channel delta.
    ///
    /// A symbol not seen before gets a zero-valued placeholder first.
    pub fn apply_delta(&mut self, symbol: &str, delta: &TickerDelta) {
        self.merge_delta(symbol, delta);
        self.publish();
    }

    /// Merges every delta of one push frame, publishing once.
    pub fn apply_deltas(&mut self, deltas: &[(String, TickerDelta)]) {
        for (symbol, delta) in deltas {
            self.merge_delta(symbol, delta);
        }
        self.publish();
    }

    fn merge_delta(&mut self, symbol: &str, delta: &TickerDelta) {
        let record = self
            .records
            .entry(symbol.to_string())
            .or_insert_with(|| TickerRecord::placeholder(symbol));

        if let Some(price) = delta.price {
            record.price = price;
        }
        if let Some(volume) = delta.volume {
            record.volume = volume;
        }
        if let Some(change) = delta.change_24h {
            record.change_24h = change;
        }
    }

    /// Sets the optional fields carried by `enrichment`.
    ///
    /// Fields it does not carry keep their prior value, known or not.
    /// Enrichment for a symbol the store has never seen is dropped, but
    /// still publishes. Returns whether the symbol was found.
    pub fn apply_enrichment(&mut self, symbol: &str, enrichment: &Enrichment) -> bool {
        let found = match self.records.get_mut(symbol) {
            Some(record) => {
                for (window, value) in enrichment.fields() {
                    *record.change_mut(*window) = Some(*value);
                }
                true
            }
            None => {
                debug!(symbol, "Dropping enrichment for unknown symbol");
                false
            }
        };
        self.publish();
        found
    }

    /// Applies the enrichments of one window push frame, publishing once.
    pub fn apply_enrichments(&mut self, batch: &[(String, Enrichment)]) {
        for (symbol, enrichment) in batch {
            if let Some(record) = self.records.get_mut(symbol) {
                for (window, value) in enrichment.fields() {
                    *record.change_mut(*window) = Some(*value);
                }
            }
        }
        self.publish();
    }

    /// Flags the store as loaded without data (bootstrap ceiling passed).
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
        self.publish();
    }

    /// Takes an independent snapshot of the current state.
    pub fn read(&self) -> Arc<MarketSnapshot> {
        Arc::new(MarketSnapshot {
            version: self.version,
            loaded: self.loaded,
            records: self.records.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn publish(&mut self) {
        self.version += 1;
        self.bus.publish(self.read());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instrument::SymbolInfo;

    fn row(symbol: &str, price: f64, count: u64) -> Ticker24h {
        Ticker24h {
            symbol: symbol.to_string(),
            last_price: price,
            price_change_percent: 1.5,
            quote_volume: 1000.0,
            count,
        }
    }

    fn info(entries: &[(&str, &str)]) -> ExchangeInfo {
        ExchangeInfo {
            symbols: entries
                .iter()
                .map(|(symbol, status)| SymbolInfo {
                    symbol: symbol.to_string(),
                    status: status.to_string(),
                    quote_asset: None,
                })
                .collect(),
        }
    }

    #[test]
    fn snapshot_keeps_only_trading_symbols_with_trades() {
        let mut store = TickerStore::new(NotificationBus::new());
        let rows = vec![
            row("BTCUSDT", 50_000.0, 10),
            row("ETHUSDT", 3_000.0, 0),
            row("OLDUSDT", 1.0, 5),
        ];
        let meta = info(&[
            ("BTCUSDT", "TRADING"),
            ("ETHUSDT", "TRADING"),
            ("OLDUSDT", "BREAK"),
        ]);

        assert_eq!(store.apply_snapshot(rows, &meta), 1);
        let snap = store.read();
        assert!(snap.loaded);
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.records["BTCUSDT"].price, 50_000.0);
        assert_eq!(snap.records["BTCUSDT"].quote, Some(QuoteAsset::Usdt));
    }

    #[test]
    fn snapshot_never_removes_push_records_or_enrichment() {
        let mut store = TickerStore::new(NotificationBus::new());
        store.apply_delta(
            "NEWUSDT",
            &TickerDelta {
                price: Some(2.0),
                ..TickerDelta::default()
            },
        );
        store.apply_delta("BTCUSDT", &TickerDelta::default());
        store.apply_enrichment("BTCUSDT", &Enrichment::single(Window::H1, 0.4));

        store.apply_snapshot(
            vec![row("BTCUSDT", 51_000.0, 3)],
            &info(&[("BTCUSDT", "TRADING")]),
        );

        let snap = store.read();
        assert_eq!(snap.records.len(), 2);
        assert_eq!(snap.records["NEWUSDT"].price, 2.0);
        assert_eq!(snap.records["BTCUSDT"].price, 51_000.0);
        assert_eq!(snap.records["BTCUSDT"].change_1h, Some(0.4));
    }

    #[test]
    fn delta_for_unknown_symbol_creates_zeroed_placeholder() {
        let mut store = TickerStore::new(NotificationBus::new());
        store.apply_delta(
            "XYZBTC",
            &TickerDelta {
                volume: Some(12.0),
                ..TickerDelta::default()
            },
        );

        let record = &store.read().records["XYZBTC"];
        assert_eq!(record.price, 0.0);
        assert_eq!(record.change_24h, 0.0);
        assert_eq!(record.volume, 12.0);
        assert_eq!(record.change_1h, None);
        assert_eq!(record.quote, Some(QuoteAsset::Btc));
    }

    #[test]
    fn delta_never_clears_optional_fields() {
        let mut store = TickerStore::new(NotificationBus::new());
        store.apply_delta("BTCUSDT", &TickerDelta::default());
        store.apply_enrichment(
            "BTCUSDT",
            &Enrichment::single(Window::H1, 0.5).with(Window::D30, -12.0),
        );
        store.apply_delta(
            "BTCUSDT",
            &TickerDelta {
                price: Some(1.0),
                volume: Some(2.0),
                change_24h: Some(3.0),
            },
        );

        let record = &store.read().records["BTCUSDT"];
        assert_eq!(record.change_1h, Some(0.5));
        assert_eq!(record.change_30d, Some(-12.0));
        assert_eq!(record.change_4h, None);
        assert_eq!(record.change_24h, 3.0);
    }

    #[test]
    fn enrichment_only_touches_carried_fields() {
        let mut store = TickerStore::new(NotificationBus::new());
        store.apply_delta("ETHUSDT", &TickerDelta::default());
        store.apply_enrichment("ETHUSDT", &Enrichment::single(Window::H4, 2.0));
        store.apply_enrichment("ETHUSDT", &Enrichment::default());
        store.apply_enrichment("ETHUSDT", &Enrichment::single(Window::H1, 0.0));

        let record = &store.read().records["ETHUSDT"];
        assert_eq!(record.change_4h, Some(2.0));
        assert_eq!(record.change_1h, Some(0.0));
        assert_eq!(record.missing(&Window::ALL), vec![Window::D7, Window::D30]);
    }

    #[test]
    fn enrichment_for_unknown_symbol_is_dropped() {
        let mut store = TickerStore::new(NotificationBus::new());
        assert!(!store.apply_enrichment("NOPE", &Enrichment::single(Window::H1, 1.0)));
        assert!(store.is_empty());
    }

    #[test]
    fn every_mutation_publishes_exactly_once() {
        let bus = NotificationBus::new();
        let mut store = TickerStore::new(bus.clone());

        store.apply_delta("A", &TickerDelta::default());
        assert_eq!(bus.latest().version, 1);
        store.apply_deltas(&[
            ("B".to_string(), TickerDelta::default()),
            ("C".to_string(), TickerDelta::default()),
        ]);
        assert_eq!(bus.latest().version, 2);
        store.apply_enrichment("A", &Enrichment::single(Window::H1, 1.0));
        assert_eq!(bus.latest().version, 3);
        store.mark_loaded();
        assert_eq!(bus.latest().version, 4);
        assert!(bus.latest().loaded);
        assert_eq!(bus.latest().records.len(), 3);
    }

    #[test]
    fn published_snapshot_is_independent_of_store() {
        let bus = NotificationBus::new();
        let mut store = TickerStore::new(bus.clone());
        store.apply_delta(
            "A",
            &TickerDelta {
                price: Some(1.0),
                ..TickerDelta::default()
            },
        );
        let before = bus.latest();

        store.apply_delta(
            "A",
            &TickerDelta {
                price: Some(2.0),
                ..TickerDelta::default()
            },
        );

        assert_eq!(before.records["A"].price, 1.0);
        assert_eq!(bus.latest().records["A"].price, 2.0);
    }

    #[test]
    fn window_labels_parse_case_insensitively() {
        assert_eq!(Window::from_label("4H"), Some(Window::H4));
        assert_eq!(Window::from_label("30d"), Some(Window::D30));
        assert_eq!(Window::from_label("1w"), None);
        assert_eq!(Window::D7.days(), Some(7));
        assert_eq!(Window::H1.days(), None);
    }
}
