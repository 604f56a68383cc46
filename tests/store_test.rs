//! Ticker store merge behavior across bootstrap, push, and enrichment.

mod common;

use tickerboard::bus::NotificationBus;
use tickerboard::models::instrument::{ExchangeInfo, SymbolInfo};
use tickerboard::store::{Enrichment, TickerDelta, TickerStore, Window, spawn_store};
use tickerboard::symbol::QuoteAsset;

use common::{ticker, trading};

fn symbols(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("SYM{i:03}USDT")).collect()
}

#[test]
fn delta_for_unseen_symbol_adds_placeholder_next_to_snapshot() {
    let bus = NotificationBus::new();
    let mut store = TickerStore::new(bus.clone());

    let names = symbols(500);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let rows = names.iter().map(|s| ticker(s, 1.0, 1_000.0)).collect();
    assert_eq!(store.apply_snapshot(rows, &trading(&refs)), 500);

    store.apply_delta(
        "NEWCOINUSDT",
        &TickerDelta {
            price: None,
            volume: None,
            change_24h: None,
        },
    );

    let snapshot = bus.latest();
    assert_eq!(snapshot.records.len(), 501);
    let fresh = &snapshot.records["NEWCOINUSDT"];
    assert_eq!(fresh.price, 0.0);
    assert_eq!(fresh.volume, 0.0);
    assert_eq!(fresh.change_24h, 0.0);
    assert_eq!(fresh.change_1h, None);

    store.apply_delta(
        "NEWCOINUSDT",
        &TickerDelta {
            price: Some(0.5),
            volume: Some(20.0),
            change_24h: Some(-3.0),
        },
    );
    let fresh = &bus.latest().records["NEWCOINUSDT"];
    assert_eq!(fresh.price, 0.5);
    assert_eq!(fresh.volume, 20.0);
    assert_eq!(fresh.change_24h, -3.0);
}

#[test]
fn snapshot_skips_non_trading_and_untraded_rows() {
    let bus = NotificationBus::new();
    let mut store = TickerStore::new(bus.clone());

    let info = ExchangeInfo {
        symbols: vec![
            SymbolInfo {
                symbol: "BTCUSDT".to_string(),
                status: "TRADING".to_string(),
                quote_asset: Some("USDT".to_string()),
            },
            SymbolInfo {
                symbol: "OLDUSDT".to_string(),
                status: "BREAK".to_string(),
                quote_asset: None,
            },
            SymbolInfo {
                symbol: "IDLEUSDT".to_string(),
                status: "TRADING".to_string(),
                quote_asset: None,
            },
        ],
    };
    let mut idle = ticker("IDLEUSDT", 1.0, 0.0);
    idle.count = 0;
    let rows = vec![ticker("BTCUSDT", 64_000.0, 1e9), ticker("OLDUSDT", 2.0, 10.0), idle];

    assert_eq!(store.apply_snapshot(rows, &info), 1);
    let snapshot = bus.latest();
    assert!(snapshot.loaded);
    assert_eq!(snapshot.records.keys().collect::<Vec<_>>(), vec!["BTCUSDT"]);
}

#[test]
fn snapshot_keeps_push_records_and_enrichment() {
    let bus = NotificationBus::new();
    let mut store = TickerStore::new(bus.clone());

    store.apply_delta(
        "ETHUSDT",
        &TickerDelta {
            price: Some(3_000.0),
            volume: Some(5.0),
            change_24h: Some(1.0),
        },
    );
    store.apply_delta("PUSHONLY", &TickerDelta::default());
    store.apply_enrichment("ETHUSDT", &Enrichment::single(Window::H4, 2.5));

    store.apply_snapshot(vec![ticker("ETHUSDT", 3_100.0, 6.0)], &trading(&["ETHUSDT"]));

    let snapshot = bus.latest();
    assert_eq!(snapshot.records.len(), 2);
    let eth = &snapshot.records["ETHUSDT"];
    assert_eq!(eth.price, 3_100.0);
    assert_eq!(eth.change_4h, Some(2.5));
}

#[test]
fn enrichment_never_creates_or_clears() {
    let bus = NotificationBus::new();
    let mut store = TickerStore::new(bus.clone());
    store.apply_delta("A", &TickerDelta::default());

    assert!(store.apply_enrichment("A", &Enrichment::single(Window::H1, 1.0)));
    assert!(store.apply_enrichment("A", &Enrichment::single(Window::D7, 7.0)));
    assert!(!store.apply_enrichment("GHOST", &Enrichment::single(Window::H1, 1.0)));

    let snapshot = bus.latest();
    assert_eq!(snapshot.records.len(), 1);
    let a = &snapshot.records["A"];
    assert_eq!(a.change_1h, Some(1.0));
    assert_eq!(a.change_7d, Some(7.0));
    assert_eq!(a.change_4h, None);
}

#[test]
fn every_mutation_publishes_once_with_independent_copy() {
    let bus = NotificationBus::new();
    let mut store = TickerStore::new(bus.clone());

    store.apply_delta("A", &TickerDelta::default());
    let first = bus.latest();
    assert_eq!(first.version, 1);

    store.apply_deltas(&[
        ("B".to_string(), TickerDelta::default()),
        ("C".to_string(), TickerDelta::default()),
    ]);
    assert_eq!(bus.latest().version, 2);

    store.mark_loaded();
    assert_eq!(bus.latest().version, 3);

    // Earlier snapshots are unaffected by later writes.
    assert_eq!(first.records.len(), 1);
    assert!(!first.loaded);
}

#[tokio::test]
async fn handle_applies_commands_through_the_store_task() {
    let bus = NotificationBus::new();
    let mut rx = bus.subscribe();
    let (handle, _task) = spawn_store(TickerStore::new(bus.clone()));

    handle.apply_snapshot(vec![ticker("BTCUSDT", 1.0, 2.0)], trading(&["BTCUSDT"]));
    handle.apply_enrichment("BTCUSDT".to_string(), Enrichment::single(Window::H1, 0.5));

    rx.wait_for(|s| s.version >= 2).await.unwrap();
    let snapshot = rx.borrow().clone();
    assert!(snapshot.loaded);
    assert_eq!(snapshot.records["BTCUSDT"].change_1h, Some(0.5));
}

#[test]
fn metadata_quote_asset_takes_precedence_over_the_suffix() {
    let bus = NotificationBus::new();
    let mut store = TickerStore::new(bus.clone());

    let listed = |symbol: &str, quote: Option<&str>| SymbolInfo {
        symbol: symbol.to_string(),
        status: "TRADING".to_string(),
        quote_asset: quote.map(str::to_string),
    };
    let info = ExchangeInfo {
        symbols: vec![
            listed("WRAPPEDBNB", Some("BNB")),
            listed("ETHDAI", Some("DAI")),
            listed("SOLUSDC", None),
        ],
    };
    let rows = vec![
        ticker("WRAPPEDBNB", 1.0, 1.0),
        ticker("ETHDAI", 3_000.0, 1.0),
        ticker("SOLUSDC", 150.0, 1.0),
    ];

    assert_eq!(store.apply_snapshot(rows, &info), 3);
    let snapshot = bus.latest();
    // No known suffix, but the metadata names the quote.
    assert_eq!(snapshot.records["WRAPPEDBNB"].quote, Some(QuoteAsset::Bnb));
    // An unknown quote code leaves suffix inference in place.
    assert_eq!(snapshot.records["ETHDAI"].quote, None);
    assert_eq!(snapshot.records["SOLUSDC"].quote, Some(QuoteAsset::Usdc));
}
