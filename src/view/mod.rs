//! Virtualized, sortable table state.
//!
//! [`TableView`] turns the latest [`MarketSnapshot`] into a sorted,
//! filtered symbol order and a bounded window of rows to draw. Sorting is
//! redone only when the snapshot version, sort state, or filter changes,
//! and every recompute publishes the new order so the enrichment
//! scheduler can follow what the user is looking at.
//!
//! The caller decides how often to call [`TableView::refresh`]; the
//! terminal front end does it once per frame, which debounces bursts of
//! push updates to frame granularity.

pub mod sort;
pub mod window;

use tokio::sync::watch;
use tracing::trace;

use crate::store::{MarketSnapshot, TickerRecord};
use crate::symbol::QuoteAsset;

pub use sort::{SortDirection, SortField, SortState, sort_rows};
pub use window::{RowPlacement, Viewport, VisibleRange, max_scroll_offset, visible_range};

/// What the cached order was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OrderKey {
    version: u64,
    sort: SortState,
    quote: Option<QuoteAsset>,
}

/// Sorted order, scroll position and viewport of the ticker table.
pub struct TableView {
    sort: SortState,
    quote_filter: Option<QuoteAsset>,
    scroll_offset: f64,
    viewport_height: f64,
    row_height: f64,
    overscan: usize,
    order: Vec<String>,
    computed_for: Option<OrderKey>,
    order_tx: watch::Sender<Vec<String>>,
}

impl TableView {
    /// Creates a view that publishes its order on `order_tx`.
    pub fn new(order_tx: watch::Sender<Vec<String>>) -> Self {
        Self {
            sort: SortState::default(),
            quote_filter: None,
            scroll_offset: 0.0,
            viewport_height: 0.0,
            row_height: 1.0,
            overscan: window::DEFAULT_OVERSCAN,
            order: Vec::new(),
            computed_for: None,
            order_tx,
        }
    }

    /// Overrides row height (default one terminal cell).
    pub fn with_row_height(mut self, row_height: f64) -> Self {
        if row_height.is_finite() && row_height > 0.0 {
            self.row_height = row_height;
        }
        self
    }

    /// Recomputes the order if anything it depends on changed.
    ///
    /// Returns `true` when a recompute (and publish) happened.
    pub fn refresh(&mut self, snapshot: &MarketSnapshot) -> bool {
        let key = OrderKey {
            version: snapshot.version,
            sort: self.sort,
            quote: self.quote_filter,
        };
        if self.computed_for == Some(key) {
            return false;
        }

        let mut rows: Vec<&TickerRecord> = snapshot
            .records
            .values()
            .filter(|r| self.quote_filter.is_none() || r.quote == self.quote_filter)
            .collect();
        sort_rows(&mut rows, &self.sort);

        self.order = rows.into_iter().map(|r| r.symbol.clone()).collect();
        self.computed_for = Some(key);
        self.clamp_scroll();
        self.order_tx.send_replace(self.order.clone());
        trace!(rows = self.order.len(), version = snapshot.version, "Table order recomputed");
        true
    }

    /// Current sorted, filtered symbol order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn quote_filter(&self) -> Option<QuoteAsset> {
        self.quote_filter
    }

    /// Selects a sort column (see [`SortState::select`]).
    pub fn select_sort(&mut self, field: SortField) {
        self.sort.select(field);
    }

    /// Steps the quote filter through `None → USDT → FDUSD → … → None`.
    pub fn cycle_quote_filter(&mut self) {
        self.quote_filter = match self.quote_filter {
            None => Some(QuoteAsset::ALL[0]),
            Some(current) => QuoteAsset::ALL
                .iter()
                .position(|q| *q == current)
                .and_then(|i| QuoteAsset::ALL.get(i + 1))
                .copied(),
        };
        self.scroll_offset = 0.0;
    }

    pub fn set_quote_filter(&mut self, quote: Option<QuoteAsset>) {
        self.quote_filter = quote;
        self.scroll_offset = 0.0;
    }

    /// Sets the viewport height in the same unit as the row height.
    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height.max(0.0);
        self.clamp_scroll();
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Scrolls by `rows` (negative is up), clamped to the list.
    pub fn scroll_rows(&mut self, rows: isize) {
        self.scroll_offset += rows as f64 * self.row_height;
        self.clamp_scroll();
    }

    /// Scrolls by one viewport height.
    pub fn page(&mut self, down: bool) {
        let delta = self.viewport_height.max(self.row_height);
        self.scroll_offset += if down { delta } else { -delta };
        self.clamp_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0.0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = f64::INFINITY;
        self.clamp_scroll();
    }

    /// Index of the first fully visible row.
    pub fn first_visible(&self) -> usize {
        (self.scroll_offset / self.row_height).floor() as usize
    }

    /// Rows to materialize for the current scroll position.
    pub fn visible(&self) -> VisibleRange {
        visible_range(
            self.order.len(),
            &Viewport {
                scroll_offset: self.scroll_offset,
                height: self.viewport_height,
                row_height: self.row_height,
                overscan: self.overscan,
            },
        )
    }

    fn clamp_scroll(&mut self) {
        let max = max_scroll_offset(self.order.len(), self.viewport_height, self.row_height);
        self.scroll_offset = self.scroll_offset.clamp(0.0, max);
    }
}
