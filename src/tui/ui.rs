//! Main UI rendering coordinator.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
};

use super::app::App;
use super::components::{status_bar, ticker_table};

/// Renders the entire application UI.
///
/// Takes the app mutably to size the table viewport to the frame.
pub fn render(frame: &mut Frame, app: &mut App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(4),    // Table
            Constraint::Length(1), // Keybindings help
        ])
        .split(frame.area());

    let body = layout[1]
        .height
        .saturating_sub(ticker_table::CHROME_HEIGHT);
    app.table.set_viewport_height(f64::from(body));

    status_bar::render(frame, layout[0], app);
    ticker_table::render(frame, layout[1], app);
    render_keybindings(frame, layout[2]);
}

fn render_keybindings(frame: &mut Frame, area: Rect) {
    let help = "[1-8]sort [f]quote filter [j/k]scroll [PgUp/PgDn]page [g/G]top/bottom [r]reconnect [q]quit";
    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}
