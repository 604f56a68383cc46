//! Wires the store, push channel, bootstrap, and enrichment together.
//!
//! ```text
//!   bootstrap ─┐
//!   push feed ─┼─> store task ─> NotificationBus ─> consumers (TableView)
//!   enrichment ┘        ^                                  │
//!                       └──── enrichment scheduler <── sorted order
//! ```
//!
//! [`Engine::start`] spawns every task and returns an [`EngineHandle`];
//! consumers subscribe to snapshots through it and report their current
//! sort order back so enrichment follows what is on screen.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::MarketApi;
use crate::bootstrap;
use crate::bus::NotificationBus;
use crate::config::AppConfig;
use crate::enrichment::{EnrichmentScheduler, PendingFetchSet};
use crate::models::Stream;
use crate::store::{MarketSnapshot, StoreHandle, TickerStore, spawn_store};
use crate::websocket::{ConnectionHandle, ConnectionManager, ConnectionState};

/// Running engine tasks and the channels consumers use.
pub struct EngineHandle {
    bus: NotificationBus,
    store: StoreHandle,
    connection: ConnectionHandle,
    order_tx: watch::Sender<Vec<String>>,
    pending: PendingFetchSet,
    scheduler: JoinHandle<()>,
    connection_task: JoinHandle<()>,
}

/// Starts every engine task under the current runtime.
pub struct Engine;

impl Engine {
    /// Spawns the store, connection manager, bootstrap, and scheduler,
    /// then requests the push connection.
    pub fn start<A: MarketApi>(config: &AppConfig, api: A) -> EngineHandle {
        let api = Arc::new(api);
        let bus = NotificationBus::new();
        let (store, _store_task) = spawn_store(TickerStore::new(bus.clone()));

        let streams = Stream::for_windows(&config.engine.windows);
        let (manager, connection) = ConnectionManager::new(
            config.exchange.websocket_urls.clone(),
            streams,
            store.clone(),
        );
        let connection_task = tokio::spawn(manager.run());
        connection.connect();

        // Detached: outlives `stop` so an in-flight snapshot still lands.
        {
            let api = Arc::clone(&api);
            let store = store.clone();
            let bases = config.exchange.rest_urls.clone();
            let ceiling = config.engine.bootstrap_timeout;
            tokio::spawn(async move {
                bootstrap::run(api.as_ref(), &bases, &store, ceiling).await;
            });
        }

        let (order_tx, order_rx) = watch::channel(Vec::new());
        let scheduler = EnrichmentScheduler::new(
            api,
            store.clone(),
            bus.subscribe(),
            order_rx,
            config.engine.windows.clone(),
            config.engine.enrich_interval,
        );
        let pending = scheduler.pending();
        let scheduler = tokio::spawn(scheduler.run());

        info!(
            rest_domains = config.exchange.rest_urls.len(),
            push_endpoints = config.exchange.websocket_urls.len(),
            "Engine started"
        );

        EngineHandle {
            bus,
            store,
            connection,
            order_tx,
            pending,
            scheduler,
            connection_task,
        }
    }
}

impl EngineHandle {
    /// Subscribes to store snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MarketSnapshot>> {
        self.bus.subscribe()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<MarketSnapshot> {
        self.bus.latest()
    }

    /// Sender for the consumer's current sorted symbol order.
    pub fn order_sender(&self) -> watch::Sender<Vec<String>> {
        self.order_tx.clone()
    }

    /// Replaces the order the scheduler follows.
    pub fn set_sorted_order(&self, order: Vec<String>) {
        self.order_tx.send_replace(order);
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Symbols with an enrichment fetch in flight.
    pub fn pending(&self) -> &PendingFetchSet {
        &self.pending
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Disconnects the push channel and stops the scheduler.
    ///
    /// Network calls already in flight are left to finish: enrichment
    /// fetches and the bootstrap snapshot still reach the store.
    pub async fn stop(self) {
        self.connection.disconnect();
        self.scheduler.abort();
        let _ = self.connection_task.await;
        info!("Engine stopped");
    }
}
