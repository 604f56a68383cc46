//! Push-channel plumbing for the exchange's combined ticker streams.
//!
//! This module is organized by concern:
//! - [`handler`] - Parsing inbound frames into store updates
//! - [`connection`] - Connection lifecycle, endpoint failover and backoff

pub mod connection;
pub mod handler;

use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::info;
use tungstenite::Message;

use crate::Result;
use crate::models::Stream;

pub use connection::{
    CONNECT_TIMEOUT, ConnectionCommand, ConnectionHandle, ConnectionManager, ConnectionState,
    ConnectionStatus, IDLE_TIMEOUT, reconnect_delay,
};
pub use handler::{StreamUpdate, parse_frame};

/// Write half of a push-channel connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a push-channel connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`TickerboardError`](crate::TickerboardError) if the
/// connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!(%url, "WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Builds the combined-stream URL for `streams` on endpoint `base`.
pub fn stream_url(base: &str, streams: &[Stream]) -> String {
    let names: Vec<&str> = streams.iter().map(Stream::as_str).collect();
    format!(
        "{}/stream?streams={}",
        base.trim_end_matches('/'),
        names.join("/")
    )
}
