//! Wire models for the exchange's REST and push-stream payloads.
//!
//! Numeric fields arrive as decimal strings (`"0.0025"`) on both
//! transports; [`decimal`] parses them into `f64` while still accepting
//! bare JSON numbers.

pub mod candle;
pub mod instrument;
pub mod ticker;

use serde::{Deserialize, Deserializer};

use crate::store::Window;

/// Push streams the board multiplexes on one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    /// Rolling 24h statistics for every symbol (`!ticker@arr`).
    AllTickers,
    /// Rolling window statistics for every symbol (`!ticker_1h@arr`, ...).
    WindowTickers(Window),
}

impl Stream {
    /// Returns the wire-format stream identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::AllTickers => "!ticker@arr",
            Stream::WindowTickers(Window::H1) => "!ticker_1h@arr",
            Stream::WindowTickers(Window::H4) => "!ticker_4h@arr",
            Stream::WindowTickers(Window::D7) => "!ticker_7d@arr",
            Stream::WindowTickers(Window::D30) => "!ticker_30d@arr",
        }
    }

    /// Parses a wire-format stream identifier.
    pub fn from_id(id: &str) -> Option<Stream> {
        match id {
            "!ticker@arr" => Some(Stream::AllTickers),
            "!ticker_1h@arr" => Some(Stream::WindowTickers(Window::H1)),
            "!ticker_4h@arr" => Some(Stream::WindowTickers(Window::H4)),
            "!ticker_7d@arr" => Some(Stream::WindowTickers(Window::D7)),
            "!ticker_30d@arr" => Some(Stream::WindowTickers(Window::D30)),
            _ => None,
        }
    }

    /// Streams to multiplex for the given backfilled windows.
    ///
    /// Only the hourly windows exist as push streams on the exchange; the
    /// day-scale windows are left to the enrichment scheduler.
    pub fn for_windows(windows: &[Window]) -> Vec<Stream> {
        let mut streams = vec![Stream::AllTickers];
        streams.extend(
            windows
                .iter()
                .filter(|w| matches!(w, Window::H1 | Window::H4))
                .map(|w| Stream::WindowTickers(*w)),
        );
        streams
    }
}

/// A combined-stream envelope: `{"stream": "...", "data": ...}`.
#[derive(Deserialize)]
pub struct StreamEnvelope {
    pub stream: String,
    pub data: serde_json::Value,
}

/// Deserializes an `f64` from either a decimal string or a JSON number.
pub fn decimal<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid decimal {s:?}: {e}"))),
    }
}
