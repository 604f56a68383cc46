//! Visible-range computation for a fixed-row-height list.

use std::ops::Range;

/// Extra rows materialized above and below the viewport.
pub const DEFAULT_OVERSCAN: usize = 10;

/// Geometry of the list viewport, in the same unit as the scroll offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scroll_offset: f64,
    pub height: f64,
    pub row_height: f64,
    pub overscan: usize,
}

/// A row to materialize and where it goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowPlacement {
    pub index: usize,
    /// Absolute top offset of the row within the full list.
    pub top: f64,
}

/// The slice of the list to materialize.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
    pub rows: Vec<RowPlacement>,
    /// Height of the whole list, for scrollbar sizing.
    pub total_height: f64,
}

impl VisibleRange {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Computes the minimal contiguous range `[start, end)` of a `len`-row list
/// covering the viewport plus overscan on both sides.
///
/// `start = max(0, floor(offset / row) − overscan)` and
/// `end = min(len, start + ceil(height / row) + 2 × overscan)`, so the
/// range never exceeds `ceil(height / row) + 2 × overscan` rows no matter
/// how long the list is. Negative or non-finite geometry is treated as zero.
pub fn visible_range(len: usize, viewport: &Viewport) -> VisibleRange {
    let row_height = if viewport.row_height.is_finite() && viewport.row_height > 0.0 {
        viewport.row_height
    } else {
        1.0
    };
    let offset = sanitize(viewport.scroll_offset);
    let height = sanitize(viewport.height);

    let first_visible = (offset / row_height).floor() as usize;
    let visible_rows = (height / row_height).ceil() as usize;

    let start = first_visible.saturating_sub(viewport.overscan).min(len);
    let end = start
        .saturating_add(visible_rows)
        .saturating_add(viewport.overscan.saturating_mul(2))
        .min(len);

    let rows = (start..end)
        .map(|index| RowPlacement {
            index,
            top: index as f64 * row_height,
        })
        .collect();

    VisibleRange {
        start,
        end,
        rows,
        total_height: len as f64 * row_height,
    }
}

/// Largest valid scroll offset for a list of `len` rows.
pub fn max_scroll_offset(len: usize, height: f64, row_height: f64) -> f64 {
    (len as f64 * row_height - sanitize(height)).max(0.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
