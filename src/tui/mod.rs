//! Terminal dashboard for the live ticker table.
//!
//! A Ratatui front end over the engine: it subscribes to store snapshots,
//! renders the sorted, windowed table, and reports its sort order back.

pub mod app;
pub mod components;
pub mod event;
pub mod terminal;
pub mod ui;

pub use app::App;
pub use event::{Action, Event, Message};
pub use terminal::{Tui, restore_terminal, setup_terminal};
pub use ui::render;
