//! Push-channel lifecycle management.
//!
//! [`ConnectionManager`] owns the connection state machine:
//!
//! ```text
//! Idle -> Connecting -> Open -> Closed -> Connecting(next endpoint) -> ...
//! ```
//!
//! Every close, clean or not, rotates to the next endpoint and schedules a
//! reconnect after a capped exponential delay. Only an explicit
//! [`ConnectionHandle::disconnect`] (or dropping every handle) reaches the
//! terminal `Closed` state with no retry scheduled. A connect attempt that
//! outlives [`CONNECT_TIMEOUT`] or an open channel silent for
//! [`IDLE_TIMEOUT`] counts as a close.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tungstenite::Message as WsMessage;

use super::handler::{StreamUpdate, parse_frame};
use super::{WsReader, WsWriter, connect, stream_url};
use crate::models::Stream;
use crate::store::{Enrichment, StoreHandle};

/// Delay before the first reconnect attempt.
const BASE_DELAY_MS: f64 = 1_000.0;

/// Multiplier applied per consecutive failed attempt.
const GROWTH_FACTOR: f64 = 1.5;

/// Upper bound on the reconnect delay.
const MAX_DELAY_MS: f64 = 10_000.0;

/// Limit on a single connect attempt, handshake included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An open channel that delivers no frame for this long is treated as lost.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Reconnect delay after `attempt` consecutive closes without an open:
/// `min(1000ms × 1.5^attempt, 10s)`.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let exponent = attempt.min(64) as i32;
    let ms = (BASE_DELAY_MS * GROWTH_FACTOR.powi(exponent)).min(MAX_DELAY_MS);
    Duration::from_millis(ms as u64)
}

/// Coarse lifecycle position of the push channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
}

impl ConnectionStatus {
    /// Returns a display string for the status.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "Idle",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Open => "Live",
            ConnectionStatus::Closed => "Offline",
        }
    }
}

/// Full connection state as published to observers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    /// Consecutive closes since the last successful open.
    pub reconnect_attempt: u32,
    /// Index into the manager's endpoint list of the current/next endpoint.
    pub endpoint_index: usize,
    /// Delay of the scheduled reconnect; `None` once shut down.
    pub next_retry: Option<Duration>,
}

impl ConnectionState {
    /// `true` while an attempt is in progress or the channel is up.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::Connecting | ConnectionStatus::Open
        )
    }

    /// Moves to `Connecting`. Returns `false` (and changes nothing) if a
    /// connection is already connecting or open.
    pub fn begin_connect(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.status = ConnectionStatus::Connecting;
        self.next_retry = None;
        true
    }

    /// The channel opened.
    pub fn on_open(&mut self) {
        self.status = ConnectionStatus::Open;
        self.reconnect_attempt = 0;
    }

    /// The channel closed or failed to open. Rotates to the next of
    /// `endpoints` and returns the delay before reconnecting.
    pub fn on_close(&mut self, endpoints: usize) -> Duration {
        let delay = reconnect_delay(self.reconnect_attempt);
        self.status = ConnectionStatus::Closed;
        self.endpoint_index = (self.endpoint_index + 1) % endpoints.max(1);
        self.reconnect_attempt = self.reconnect_attempt.saturating_add(1);
        self.next_retry = Some(delay);
        delay
    }

    /// Terminal close: no reconnect will follow.
    pub fn on_shutdown(&mut self) {
        self.status = ConnectionStatus::Closed;
        self.next_retry = None;
    }
}

/// Commands accepted by a running [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionCommand {
    /// Start connecting; ignored while connecting or open.
    Connect,
    /// Close the channel and stop reconnecting.
    Disconnect,
}

/// Clonable control surface for a [`ConnectionManager`].
#[derive(Clone)]
pub struct ConnectionHandle {
    cmd_tx: mpsc::UnboundedSender<ConnectionCommand>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    /// Asks the manager to connect. Idempotent.
    pub fn connect(&self) {
        let _ = self.cmd_tx.send(ConnectionCommand::Connect);
    }

    /// Closes the channel and suppresses further reconnects.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(ConnectionCommand::Disconnect);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that wakes on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

/// Why the reader loop exited.
enum DisconnectReason {
    /// The connection was lost, errored, or closed by the server.
    ConnectionError,
    /// A disconnect was requested or every handle was dropped.
    Shutdown,
}

/// Manages the push-channel connection including endpoint failover and
/// reconnection with capped exponential backoff.
pub struct ConnectionManager {
    endpoints: Vec<String>,
    streams: Vec<Stream>,
    store: StoreHandle,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    cmd_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    connect_timeout: Duration,
    idle_timeout: Duration,
}

impl ConnectionManager {
    /// Creates a manager over `endpoints` (rotated in order) that
    /// subscribes to `streams` and forwards updates to `store`.
    #[must_use]
    pub fn new(
        endpoints: Vec<String>,
        streams: Vec<Stream>,
        store: StoreHandle,
    ) -> (Self, ConnectionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::default());

        let manager = Self {
            endpoints,
            streams,
            store,
            state: ConnectionState::default(),
            state_tx,
            cmd_rx,
            connect_timeout: CONNECT_TIMEOUT,
            idle_timeout: IDLE_TIMEOUT,
        };
        (manager, ConnectionHandle { cmd_tx, state_rx })
    }

    /// Overrides the connect-attempt limit and the idle-read deadline.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, idle: Duration) -> Self {
        self.connect_timeout = connect;
        self.idle_timeout = idle;
        self
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn shutdown(&mut self) {
        self.state.on_shutdown();
        self.publish();
        info!("Connection manager shut down");
    }

    /// Runs the manager until disconnected.
    ///
    /// Stays `Idle` until the first [`ConnectionCommand::Connect`], then
    /// connects, reads frames into the store, and reconnects on every
    /// close. A connect requested during backoff skips the remaining delay.
    pub async fn run(mut self) {
        if self.endpoints.is_empty() {
            warn!("No push endpoints configured");
            self.shutdown();
            return;
        }

        match next_command(&mut self.cmd_rx).await {
            ConnectionCommand::Connect => {}
            ConnectionCommand::Disconnect => {
                self.shutdown();
                return;
            }
        }

        loop {
            self.state.begin_connect();
            self.publish();

            let endpoint = &self.endpoints[self.state.endpoint_index];
            let url = stream_url(endpoint, &self.streams);
            info!(%url, endpoint_index = self.state.endpoint_index, "Connecting to push channel");

            let connected = tokio::select! {
                result = tokio::time::timeout(self.connect_timeout, connect(&url)) => Some(result),
                () = wait_while_connecting(&mut self.cmd_rx) => None,
            };
            let Some(result) = connected else {
                self.shutdown();
                return;
            };

            let reason = match result {
                Ok(Ok((write, read))) => {
                    self.state.on_open();
                    self.publish();
                    info!("Push channel open");
                    self.read_loop(write, read).await
                }
                Ok(Err(e)) => {
                    warn!("Connection failed: {e}");
                    DisconnectReason::ConnectionError
                }
                Err(_) => {
                    warn!(
                        timeout_ms = self.connect_timeout.as_millis() as u64,
                        "Connection attempt timed out"
                    );
                    DisconnectReason::ConnectionError
                }
            };

            if let DisconnectReason::Shutdown = reason {
                self.shutdown();
                return;
            }

            let delay = self.state.on_close(self.endpoints.len());
            self.publish();
            info!(
                delay_ms = delay.as_millis() as u64,
                attempt = self.state.reconnect_attempt,
                next_endpoint = self.state.endpoint_index,
                "Push channel closed, backing off"
            );

            let command = tokio::select! {
                () = tokio::time::sleep(delay) => None,
                command = next_command(&mut self.cmd_rx) => Some(command),
            };
            if command == Some(ConnectionCommand::Disconnect) {
                self.shutdown();
                return;
            }
        }
    }

    /// Reads frames until the connection drops or shutdown is requested.
    async fn read_loop(&mut self, mut write: WsWriter, mut read: WsReader) -> DisconnectReason {
        let idle = tokio::time::sleep(self.idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                msg = read.next() => {
                    idle.as_mut().reset(Instant::now() + self.idle_timeout);
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => self.dispatch(&text),
                        Some(Ok(WsMessage::Close(frame))) => {
                            info!(?frame, "Server closed push channel");
                            return DisconnectReason::ConnectionError;
                        }
                        Some(Ok(_)) => {} // Pings are answered by tungstenite
                        Some(Err(e)) => {
                            warn!("WebSocket error: {e}");
                            return DisconnectReason::ConnectionError;
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return DisconnectReason::ConnectionError;
                        }
                    }
                }

                () = &mut idle => {
                    warn!(
                        idle_ms = self.idle_timeout.as_millis() as u64,
                        "No frames received, dropping push channel"
                    );
                    return DisconnectReason::ConnectionError;
                }

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(ConnectionCommand::Connect) => {
                            debug!("Connect ignored, channel already open");
                        }
                        Some(ConnectionCommand::Disconnect) | None => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            return DisconnectReason::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Forwards one text frame to the store; malformed frames are dropped.
    fn dispatch(&self, text: &str) {
        match parse_frame(text) {
            Some(StreamUpdate::Deltas(deltas)) => self.store.apply_deltas(deltas),
            Some(StreamUpdate::Window { window, changes }) => {
                let batch = changes
                    .into_iter()
                    .map(|(symbol, value)| (symbol, Enrichment::single(window, value)))
                    .collect();
                self.store.apply_enrichments(batch);
            }
            None => {}
        }
    }
}

/// Next command, treating a closed command channel as a disconnect.
async fn next_command(cmd_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>) -> ConnectionCommand {
    cmd_rx.recv().await.unwrap_or(ConnectionCommand::Disconnect)
}

/// Resolves once a disconnect arrives, ignoring repeated connects.
async fn wait_while_connecting(cmd_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>) {
    while next_command(cmd_rx).await == ConnectionCommand::Connect {
        debug!("Connect ignored, attempt already in progress");
    }
}
