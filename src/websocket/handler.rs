//! Inbound push-frame parsing.
//!
//! A frame is either a combined-stream envelope
//! (`{"stream": "!ticker@arr", "data": [...]}`) or a bare record/array from
//! a raw stream. The stream identifier decides whether the records are 24h
//! deltas or a window's change percent. Anything that does not parse is
//! reported as `None` and dropped by the caller.

use tracing::debug;

use crate::models::ticker::StreamTicker;
use crate::models::{Stream, StreamEnvelope};
use crate::store::{TickerDelta, Window};

/// Store updates decoded from one frame.
#[derive(Debug, PartialEq)]
pub enum StreamUpdate {
    /// Price, volume and 24h change for each symbol.
    Deltas(Vec<(String, TickerDelta)>),
    /// Change percent over `window` for each symbol.
    Window {
        window: Window,
        changes: Vec<(String, f64)>,
    },
}

/// Parses one text frame.
///
/// Returns `None` for malformed JSON, unknown streams, or payloads whose
/// records do not match the ticker shape.
pub fn parse_frame(text: &str) -> Option<StreamUpdate> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Dropping non-JSON frame");
            return None;
        }
    };

    let (stream, data) = if value.get("stream").is_some() {
        let envelope: StreamEnvelope = serde_json::from_value(value).ok()?;
        let Some(stream) = Stream::from_id(&envelope.stream) else {
            debug!(stream = envelope.stream, "Dropping frame from unknown stream");
            return None;
        };
        (Some(stream), envelope.data)
    } else {
        (None, value)
    };

    let tickers = parse_tickers(data)?;
    let stream = stream.or_else(|| tickers.first().and_then(|t| stream_from_event(&t.event)))?;

    Some(match stream {
        Stream::AllTickers => StreamUpdate::Deltas(
            tickers
                .into_iter()
                .map(|t| {
                    let delta = TickerDelta {
                        price: Some(t.last_price),
                        volume: Some(t.quote_volume),
                        change_24h: Some(t.price_change_percent),
                    };
                    (t.symbol, delta)
                })
                .collect(),
        ),
        Stream::WindowTickers(window) => StreamUpdate::Window {
            window,
            changes: tickers
                .into_iter()
                .map(|t| (t.symbol, t.price_change_percent))
                .collect(),
        },
    })
}

/// Accepts a single record or an array of records.
fn parse_tickers(data: serde_json::Value) -> Option<Vec<StreamTicker>> {
    let tickers = match data {
        serde_json::Value::Array(_) => serde_json::from_value::<Vec<StreamTicker>>(data),
        serde_json::Value::Object(_) => serde_json::from_value::<StreamTicker>(data).map(|t| vec![t]),
        _ => return None,
    };

    match tickers {
        Ok(tickers) => Some(tickers),
        Err(e) => {
            debug!(error = %e, "Dropping frame with malformed ticker records");
            None
        }
    }
}

/// Infers the stream of a bare record from its event type.
fn stream_from_event(event: &str) -> Option<Stream> {
    match event {
        "24hrTicker" => Some(Stream::AllTickers),
        "1hTicker" => Some(Stream::WindowTickers(Window::H1)),
        "4hTicker" => Some(Stream::WindowTickers(Window::H4)),
        _ => None,
    }
}
