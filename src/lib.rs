//! Live market dashboard engine for a spot exchange.
//!
//! Seeds a ticker table from the exchange's REST snapshot, keeps it current
//! from the combined WebSocket ticker streams, and backfills hour- and
//! day-scale change windows in the background, prioritized by whatever the
//! consumer currently has sorted to the top.

pub mod api;
pub mod bootstrap;
pub mod bus;
pub mod config;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod store;
pub mod symbol;
pub mod tui;
pub mod view;
pub mod websocket;

pub use error::{Result, TickerboardError};
