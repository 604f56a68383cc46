//! The ticker table.
//!
//! Only the rows in the view's visible range (viewport plus overscan) are
//! turned into widgets; the table is scrolled to the first visible row
//! within that slice.

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};

use crate::store::{TickerRecord, Window};
use crate::tui::app::App;
use crate::view::SortField;

/// Shown for values that are not known yet.
const UNKNOWN: &str = "—";

const COLUMNS: [(SortField, u16); 8] = [
    (SortField::Symbol, 14),
    (SortField::Price, 14),
    (SortField::Change24h, 9),
    (SortField::Volume, 10),
    (SortField::Change(Window::H1), 9),
    (SortField::Change(Window::H4), 9),
    (SortField::Change(Window::D7), 9),
    (SortField::Change(Window::D30), 9),
];

/// Rows of chrome (borders and header) around the table body.
pub const CHROME_HEIGHT: u16 = 3;

/// Renders the table into `area`.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let sort = app.table.sort();
    let header = Row::new(COLUMNS.iter().enumerate().map(|(i, (field, _))| {
        let label = if *field == sort.field {
            format!("{} {}{}", i + 1, field.label(), sort.direction.arrow())
        } else {
            format!("{} {}", i + 1, field.label())
        };
        Cell::from(label)
    }))
    .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let records = app.visible_records();
    let skip = app
        .table
        .first_visible()
        .saturating_sub(app.table.visible().start);
    let rows = records.iter().map(|(_, record)| ticker_row(record));

    let title = if app.loading() {
        " Markets (loading) ".to_string()
    } else {
        format!(" Markets ({}) ", app.table.order().len())
    };

    let table = Table::new(rows, COLUMNS.iter().map(|(_, w)| Constraint::Length(*w)))
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    let mut state = TableState::default().with_offset(skip);
    frame.render_stateful_widget(table, area, &mut state);
}

fn ticker_row(record: &TickerRecord) -> Row<'static> {
    Row::new(vec![
        Cell::from(record.symbol.clone()),
        Cell::from(format_price(record.price)),
        change_cell(Some(record.change_24h)),
        Cell::from(format_volume(record.volume)),
        change_cell(record.change_1h),
        change_cell(record.change_4h),
        change_cell(record.change_7d),
        change_cell(record.change_30d),
    ])
}

fn change_cell(value: Option<f64>) -> Cell<'static> {
    match value {
        Some(v) => {
            let color = if v >= 0.0 { Color::Green } else { Color::Red };
            Cell::from(Span::styled(format!("{v:+.2}%"), Style::default().fg(color)))
        }
        None => Cell::from(Span::styled(UNKNOWN, Style::default().fg(Color::DarkGray))),
    }
}

/// Formats a price with precision scaled to its magnitude.
pub fn format_price(price: f64) -> String {
    let decimals = match price.abs() {
        p if p >= 1_000.0 => 2,
        p if p >= 1.0 => 4,
        p if p >= 0.01 => 6,
        _ => 8,
    };
    format!("{price:.decimals$}")
}

/// Formats a quote volume with a K/M/B suffix.
pub fn format_volume(volume: f64) -> String {
    let v = volume.abs();
    if v >= 1e9 {
        format!("{:.2}B", volume / 1e9)
    } else if v >= 1e6 {
        format!("{:.2}M", volume / 1e6)
    } else if v >= 1e3 {
        format!("{:.2}K", volume / 1e3)
    } else {
        format!("{volume:.2}")
    }
}
