//! Rate-limited backfill of optional change windows.
//!
//! The push channel only carries 24h statistics, so the 1h/4h/7d/30d
//! changes come from per-symbol REST calls. The scheduler wakes on a fixed
//! cadence and issues at most one fetch per tick; that cadence is the only
//! throttle, which keeps the sustained request rate at `1 / interval`.
//!
//! Each tick rescans the consumer's current sort order from the top, so a
//! symbol that was just scrolled or sorted into view is enriched first.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::{DAILY_BAR_LIMIT, MarketApi};
use crate::models::candle::change_over_days;
use crate::store::{Enrichment, MarketSnapshot, StoreHandle, Window};

/// Symbols with an enrichment fetch in flight.
#[derive(Clone, Default)]
pub struct PendingFetchSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl PendingFetchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `symbol` as in flight unless it already is.
    ///
    /// The returned guard removes the entry when dropped, whether the fetch
    /// succeeded, failed, or its task was torn down.
    pub fn try_claim(&self, symbol: &str) -> Option<PendingGuard> {
        let mut set = self.lock();
        if !set.insert(symbol.to_string()) {
            return None;
        }
        Some(PendingGuard {
            set: self.clone(),
            symbol: symbol.to_string(),
        })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.lock().contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // The set holds plain strings; a poisoned lock still has usable data.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Membership token for one in-flight fetch.
pub struct PendingGuard {
    set: PendingFetchSet,
    symbol: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.symbol);
    }
}

/// The symbol chosen on a tick and what it still lacks.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    pub missing: Vec<Window>,
    /// Latest price, used as the "now" side of day-scale changes.
    pub price: f64,
}

/// Scans `order` front to back for the first symbol that is in the
/// snapshot, lacks one of `tracked`, and has no fetch in flight.
pub fn next_candidate(
    order: &[String],
    snapshot: &MarketSnapshot,
    tracked: &[Window],
    pending: &PendingFetchSet,
) -> Option<Candidate> {
    order.iter().find_map(|symbol| {
        let record = snapshot.records.get(symbol)?;
        let missing = record.missing(tracked);
        if missing.is_empty() || pending.contains(symbol) {
            return None;
        }
        Some(Candidate {
            symbol: symbol.clone(),
            missing,
            price: record.price,
        })
    })
}

/// Fetches every missing window for one symbol and writes each success
/// to the store independently.
///
/// Hour windows use one stats call each; day windows share one daily-bars
/// call. All sub-requests run concurrently, and a failure only leaves its
/// own field(s) unknown.
pub async fn fetch_enrichment<A: MarketApi>(api: &A, store: &StoreHandle, candidate: &Candidate) {
    let symbol = candidate.symbol.as_str();
    let hourly: Vec<Window> = candidate
        .missing
        .iter()
        .copied()
        .filter(|w| w.days().is_none())
        .collect();
    let daily: Vec<Window> = candidate
        .missing
        .iter()
        .copied()
        .filter(|w| w.days().is_some())
        .collect();

    let hourly_fetches = join_all(hourly.iter().map(|window| async move {
        match api.window_ticker(symbol, *window).await {
            Ok(ticker) => {
                store.apply_enrichment(
                    symbol.to_string(),
                    Enrichment::single(*window, ticker.price_change_percent),
                );
            }
            Err(e) => {
                warn!(symbol, window = window.label(), "Window stats fetch failed: {e}");
            }
        }
    }));

    let daily_fetch = async {
        if daily.is_empty() {
            return;
        }
        let bars = match api.daily_bars(symbol, DAILY_BAR_LIMIT).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol, "Daily bars fetch failed: {e}");
                return;
            }
        };
        let price = if candidate.price > 0.0 {
            candidate.price
        } else {
            match bars.last() {
                Some(bar) => bar.close,
                None => return,
            }
        };

        let mut enrichment = Enrichment::default();
        for window in &daily {
            let Some(days) = window.days() else { continue };
            match change_over_days(&bars, days, price) {
                Some(change) => enrichment = enrichment.with(*window, change),
                None => debug!(symbol, window = window.label(), bars = bars.len(), "Not enough history"),
            }
        }
        if !enrichment.is_empty() {
            store.apply_enrichment(symbol.to_string(), enrichment);
        }
    };

    tokio::join!(hourly_fetches, daily_fetch);
}

/// Drives enrichment from the consumer's sort order.
pub struct EnrichmentScheduler<A> {
    api: Arc<A>,
    store: StoreHandle,
    snapshots: watch::Receiver<Arc<MarketSnapshot>>,
    order: watch::Receiver<Vec<String>>,
    tracked: Vec<Window>,
    interval: Duration,
    pending: PendingFetchSet,
}

impl<A: MarketApi> EnrichmentScheduler<A> {
    #[must_use]
    pub fn new(
        api: Arc<A>,
        store: StoreHandle,
        snapshots: watch::Receiver<Arc<MarketSnapshot>>,
        order: watch::Receiver<Vec<String>>,
        tracked: Vec<Window>,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            store,
            snapshots,
            order,
            tracked,
            interval,
            pending: PendingFetchSet::new(),
        }
    }

    /// Shared view of the in-flight set.
    pub fn pending(&self) -> PendingFetchSet {
        self.pending.clone()
    }

    /// Runs one scan and spawns at most one fetch.
    ///
    /// Returns the fetch task, if one was started.
    pub fn tick(&self) -> Option<JoinHandle<()>> {
        if self.tracked.is_empty() {
            return None;
        }

        let snapshot = self.snapshots.borrow().clone();
        let candidate = {
            let order = self.order.borrow();
            next_candidate(&order, &snapshot, &self.tracked, &self.pending)?
        };
        let guard = self.pending.try_claim(&candidate.symbol)?;

        debug!(
            symbol = candidate.symbol,
            missing = ?candidate.missing.iter().map(Window::label).collect::<Vec<_>>(),
            "Enriching"
        );

        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            fetch_enrichment(api.as_ref(), &store, &candidate).await;
        }))
    }

    /// Ticks forever at the configured cadence.
    ///
    /// Stop it by aborting its task; fetches already spawned run to
    /// completion on their own.
    pub async fn run(self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            windows = ?self.tracked.iter().map(Window::label).collect::<Vec<_>>(),
            "Enrichment scheduler started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}
