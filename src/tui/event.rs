//! Event handling for the TUI.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::{mpsc, watch};

use crate::store::{MarketSnapshot, Window};
use crate::view::SortField;
use crate::websocket::{ConnectionState, ConnectionStatus};

use super::app::App;

/// Events that can occur in the application.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for UI updates.
    Tick,
}

/// Messages that update application state.
#[derive(Debug)]
pub enum Message {
    /// Input event from terminal.
    Input(Event),
    /// A new store snapshot was published.
    Snapshot(Arc<MarketSnapshot>),
    /// The push channel changed state.
    Connection(ConnectionState),
    /// Request to quit the application.
    Quit,
}

/// Actions that require the engine.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Reconnect the push channel now, skipping any backoff.
    Reconnect,
}

/// Spawns a task that polls for terminal events and sends them to a channel.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        loop {
            match tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await
            {
                Ok(Some(CrosstermEvent::Key(key))) => {
                    if tx.send(Message::Input(Event::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(w, h))) => {
                    if tx.send(Message::Input(Event::Resize(w, h))).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

/// Spawns a task that sends periodic tick events.
///
/// Ticks drive re-sorting and redraws, so bursts of store updates are
/// coalesced to at most one render per interval.
pub fn spawn_tick_timer(tx: mpsc::UnboundedSender<Message>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            if tx.send(Message::Input(Event::Tick)).is_err() {
                break;
            }
        }
    });
}

/// Forwards every value published on `rx` into the message channel.
pub fn spawn_watch_forwarder<T>(
    mut rx: watch::Receiver<T>,
    tx: mpsc::UnboundedSender<Message>,
    wrap: fn(T) -> Message,
) where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let value = rx.borrow_and_update().clone();
            if tx.send(wrap(value)).is_err() {
                break;
            }
        }
    });
}

/// Updates application state based on a message.
pub fn update(app: &mut App, message: Message) -> Option<Action> {
    match message {
        Message::Input(event) => handle_input(app, event),
        Message::Snapshot(snapshot) => {
            if app.loading() && snapshot.loaded && snapshot.records.is_empty() {
                app.show_error("No snapshot available, waiting for live data");
            }
            app.set_snapshot(snapshot);
            None
        }
        Message::Connection(state) => {
            let was_open = app.connection.status == ConnectionStatus::Open;
            if was_open && state.status == ConnectionStatus::Closed && state.next_retry.is_some() {
                app.show_error("Push channel lost, reconnecting");
            }
            app.connection = state;
            None
        }
        Message::Quit => {
            app.should_quit = true;
            None
        }
    }
}

/// Handles input events and updates application state.
fn handle_input(app: &mut App, event: Event) -> Option<Action> {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Resize(_, _) => None,
        Event::Tick => {
            app.clear_stale_errors();
            app.refresh();
            None
        }
    }
}

/// Sort column bound to a digit key.
fn sort_field_for(c: char) -> Option<SortField> {
    Some(match c {
        '1' => SortField::Symbol,
        '2' => SortField::Price,
        '3' => SortField::Change24h,
        '4' => SortField::Volume,
        '5' => SortField::Change(Window::H1),
        '6' => SortField::Change(Window::H4),
        '7' => SortField::Change(Window::D7),
        '8' => SortField::Change(Window::D30),
        _ => return None,
    })
}

/// Handles key press events.
fn handle_key(app: &mut App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => app.table.scroll_rows(1),
        KeyCode::Char('k') | KeyCode::Up => app.table.scroll_rows(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.table.page(true),
        KeyCode::PageUp => app.table.page(false),
        KeyCode::Home | KeyCode::Char('g') => app.table.scroll_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.table.scroll_to_bottom(),

        KeyCode::Char('f') => app.table.cycle_quote_filter(),
        KeyCode::Char('r') => return Some(Action::Reconnect),
        KeyCode::Char(c) => {
            if let Some(field) = sort_field_for(c) {
                app.table.select_sort(field);
            }
        }
        _ => {}
    }
    None
}
