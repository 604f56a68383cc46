//! Sort keys and the row comparator.

use std::cmp::Ordering;

use crate::store::{TickerRecord, Window};

/// Columns the table can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortField {
    Symbol,
    Price,
    Volume,
    Change24h,
    Change(Window),
}

impl SortField {
    /// Column header label.
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Symbol => "Symbol",
            SortField::Price => "Price",
            SortField::Volume => "Volume",
            SortField::Change24h => "24h",
            SortField::Change(window) => window.label(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Active sort column and direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::Volume,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    /// Selecting the active field flips direction; any other field starts
    /// descending.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Descending;
        }
    }

    /// Full comparator for this state, tie-broken on symbol.
    pub fn compare(&self, a: &TickerRecord, b: &TickerRecord) -> Ordering {
        let ordering = compare_field(self.field, a, b).then_with(|| compare_symbol(a, b));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Ascending comparison on one field.
///
/// Unknown optional values rank below every known value, so they cluster
/// at one end of the table rather than interleaving with real numbers.
pub fn compare_field(field: SortField, a: &TickerRecord, b: &TickerRecord) -> Ordering {
    match field {
        SortField::Symbol => compare_symbol(a, b),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Volume => a.volume.total_cmp(&b.volume),
        SortField::Change24h => a.change_24h.total_cmp(&b.change_24h),
        SortField::Change(window) => compare_optional(a.change(window), b.change(window)),
    }
}

fn compare_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn compare_symbol(a: &TickerRecord, b: &TickerRecord) -> Ordering {
    let ci = a
        .symbol
        .bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.symbol.bytes().map(|c| c.to_ascii_lowercase()));
    ci.then_with(|| a.symbol.cmp(&b.symbol))
}

/// Sorts `rows` in place by `state`.
pub fn sort_rows(rows: &mut [&TickerRecord], state: &SortState) {
    rows.sort_unstable_by(|a, b| state.compare(a, b));
}
