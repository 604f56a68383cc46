//! Application state for the TUI.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::store::{MarketSnapshot, TickerRecord};
use crate::view::TableView;
use crate::websocket::ConnectionState;

/// How long an error stays in the status bar.
const ERROR_TTL: Duration = Duration::from_secs(5);

/// Central application state container.
pub struct App {
    /// Latest snapshot received from the engine.
    pub snapshot: Arc<MarketSnapshot>,
    /// Sorted, filtered and windowed table state.
    pub table: TableView,
    /// Push-channel state as last reported.
    pub connection: ConnectionState,
    /// Enrichment fetches currently in flight.
    pub pending_fetches: usize,
    pub should_quit: bool,
    pub error_message: Option<ErrorDisplay>,
}

/// A transient error shown in the status bar.
#[derive(Debug, Clone)]
pub struct ErrorDisplay {
    pub message: String,
    pub timestamp: Instant,
}

impl App {
    /// Creates the app; the table publishes its order on `order_tx`.
    pub fn new(order_tx: watch::Sender<Vec<String>>) -> Self {
        Self {
            snapshot: Arc::new(MarketSnapshot::default()),
            table: TableView::new(order_tx),
            connection: ConnectionState::default(),
            pending_fetches: 0,
            should_quit: false,
            error_message: None,
        }
    }

    /// `true` until the bootstrap completed or timed out.
    pub fn loading(&self) -> bool {
        !self.snapshot.loaded
    }

    /// Stores a new snapshot; sorting happens on the next [`App::refresh`].
    pub fn set_snapshot(&mut self, snapshot: Arc<MarketSnapshot>) {
        self.snapshot = snapshot;
    }

    /// Re-sorts the table if the snapshot, sort or filter changed.
    pub fn refresh(&mut self) -> bool {
        self.table.refresh(&self.snapshot)
    }

    /// Records for the rows the table currently materializes, in order.
    pub fn visible_records(&self) -> Vec<(usize, &TickerRecord)> {
        let order = self.table.order();
        self.table
            .visible()
            .range()
            .filter_map(|index| {
                let symbol = order.get(index)?;
                self.snapshot.records.get(symbol).map(|r| (index, r))
            })
            .collect()
    }

    /// Sets an error message to display.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(ErrorDisplay {
            message: message.into(),
            timestamp: Instant::now(),
        });
    }

    /// Clears error messages older than five seconds.
    pub fn clear_stale_errors(&mut self) {
        if let Some(ref error) = self.error_message
            && error.timestamp.elapsed() > ERROR_TTL
        {
            self.error_message = None;
        }
    }
}
