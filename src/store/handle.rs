//! The task that owns a [`TickerStore`] and the handle used to reach it.
//!
//! All three writers (bootstrap, connection manager, enrichment fetches)
//! send [`StoreCommand`]s over one unbounded channel, so mutations are
//! serialized by construction. Sends after the store task is gone are
//! silently dropped: late completions are harmless.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Enrichment, TickerDelta, TickerStore};
use crate::models::instrument::ExchangeInfo;
use crate::models::ticker::Ticker24h;

/// Mutations accepted by the store task.
#[derive(Debug)]
pub enum StoreCommand {
    /// Bootstrap snapshot rows plus the metadata used to filter them.
    Snapshot {
        rows: Vec<Ticker24h>,
        info: ExchangeInfo,
    },
    /// All deltas carried by one push frame.
    Deltas(Vec<(String, TickerDelta)>),
    /// Optional fields for one symbol.
    Enrichment { symbol: String, fields: Enrichment },
    /// Optional fields for many symbols, from one window push frame.
    Enrichments(Vec<(String, Enrichment)>),
    /// Bootstrap gave up; stop reporting a loading state.
    MarkLoaded,
}

/// Cheap, clonable sender side of the store task.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
}

impl StoreHandle {
    pub fn apply_snapshot(&self, rows: Vec<Ticker24h>, info: ExchangeInfo) {
        self.send(StoreCommand::Snapshot { rows, info });
    }

    pub fn apply_delta(&self, symbol: String, delta: TickerDelta) {
        self.send(StoreCommand::Deltas(vec![(symbol, delta)]));
    }

    pub fn apply_deltas(&self, deltas: Vec<(String, TickerDelta)>) {
        if !deltas.is_empty() {
            self.send(StoreCommand::Deltas(deltas));
        }
    }

    pub fn apply_enrichment(&self, symbol: String, fields: Enrichment) {
        self.send(StoreCommand::Enrichment { symbol, fields });
    }

    pub fn apply_enrichments(&self, batch: Vec<(String, Enrichment)>) {
        if !batch.is_empty() {
            self.send(StoreCommand::Enrichments(batch));
        }
    }

    pub fn mark_loaded(&self) {
        self.send(StoreCommand::MarkLoaded);
    }

    /// Returns `true` while the store task is still receiving.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, command: StoreCommand) {
        if self.tx.send(command).is_err() {
            debug!("Store task gone, dropping command");
        }
    }
}

/// Moves `store` into a new task and returns the handle feeding it.
///
/// The task ends once every [`StoreHandle`] clone has been dropped.
pub fn spawn_store(store: TickerStore) -> (StoreHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(store, rx));
    (StoreHandle { tx }, task)
}

async fn run(mut store: TickerStore, mut rx: mpsc::UnboundedReceiver<StoreCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            StoreCommand::Snapshot { rows, info } => {
                let taken = store.apply_snapshot(rows, &info);
                info!(taken, symbols = store.len(), "Bootstrap snapshot merged");
            }
            StoreCommand::Deltas(deltas) => store.apply_deltas(&deltas),
            StoreCommand::Enrichment { symbol, fields } => {
                store.apply_enrichment(&symbol, &fields);
            }
            StoreCommand::Enrichments(batch) => store.apply_enrichments(&batch),
            StoreCommand::MarkLoaded => store.mark_loaded(),
        }
    }
    debug!("Store task exiting");
}
