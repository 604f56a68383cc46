use std::fs::OpenOptions;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{error, info};

use tickerboard::api::RestClient;
use tickerboard::config::{AppConfig, fetch_config};
use tickerboard::engine::{Engine, EngineHandle};
use tickerboard::tui::event::{spawn_event_reader, spawn_tick_timer, spawn_watch_forwarder, update};
use tickerboard::tui::{Action, App, Message, Tui, render, restore_terminal, setup_terminal};
use tickerboard::{Result, TickerboardError};

/// Tick interval; snapshot-driven re-sorts happen at most this often.
const FRAME_INTERVAL_MS: u64 = 250;

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = fetch_config()?;
    init_logging(&app_config)?;

    let primary = app_config
        .exchange
        .rest_urls
        .first()
        .ok_or_else(|| TickerboardError::Config("no REST URLs configured".to_string()))?;
    let api = RestClient::new(primary.as_str())?;
    let engine = Engine::start(&app_config, api);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &engine).await;
    restore_terminal(&mut terminal)?;

    engine.stop().await;
    if let Err(ref e) = result {
        error!("Dashboard exited with error: {e}");
    }
    result
}

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_logging(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log.file)
        .map_err(|e| {
            TickerboardError::Io(format!("cannot open log file {}: {e}", config.log.file.display()))
        })?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_max_level(config.log.level)
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(terminal: &mut Tui, engine: &EngineHandle) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_event_reader(tx.clone());
    spawn_tick_timer(tx.clone(), FRAME_INTERVAL_MS);
    spawn_watch_forwarder(engine.subscribe(), tx.clone(), Message::Snapshot);
    spawn_watch_forwarder(engine.connection().subscribe(), tx, Message::Connection);

    let mut app = App::new(engine.order_sender());
    app.set_snapshot(engine.snapshot());
    app.connection = engine.connection_state();
    info!("Dashboard started");

    while let Some(message) = rx.recv().await {
        let redraw = matches!(message, Message::Input(_));
        if let Some(action) = update(&mut app, message) {
            match action {
                Action::Reconnect => engine.connection().connect(),
            }
        }
        if app.should_quit {
            break;
        }
        if redraw {
            app.refresh();
            app.pending_fetches = engine.pending().len();
            terminal
                .draw(|frame| render(frame, &mut app))
                .map_err(|e| TickerboardError::Io(e.to_string()))?;
        }
    }
    Ok(())
}
