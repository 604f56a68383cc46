//! Status bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::tui::app::App;
use crate::websocket::ConnectionStatus;

/// Renders the status bar.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let status_color = match app.connection.status {
        ConnectionStatus::Open => Color::Green,
        ConnectionStatus::Connecting => Color::Yellow,
        ConnectionStatus::Idle | ConnectionStatus::Closed => Color::Red,
    };

    let mut connection = format!(" {} ", app.connection.status.label());
    if let Some(retry) = app.connection.next_retry {
        connection.push_str(&format!("(retry in {:.1}s) ", retry.as_secs_f64()));
    }

    let loading_span = if app.loading() {
        Span::styled(" Loading… ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            format!(" {} symbols ", app.snapshot.records.len()),
            Style::default().fg(Color::White),
        )
    };

    let sort = app.table.sort();
    let filter = app
        .table
        .quote_filter()
        .map_or("All", |q| q.as_str());

    let error_span = if let Some(ref error) = app.error_message {
        Span::styled(
            format!(" {} ", error.message),
            Style::default().fg(Color::Red),
        )
    } else {
        Span::raw("")
    };

    let line = Line::from(vec![
        Span::styled(connection, Style::default().fg(status_color)),
        Span::raw("│"),
        loading_span,
        Span::raw("│"),
        Span::raw(format!(" Sort: {} {} ", sort.field.label(), sort.direction.arrow())),
        Span::raw("│"),
        Span::raw(format!(" Quote: {filter} ")),
        Span::raw("│"),
        Span::styled(
            format!(" Enriching: {} ", app.pending_fetches),
            Style::default().fg(Color::Cyan),
        ),
        error_span,
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}
