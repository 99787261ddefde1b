//! Column widths and row heights for a table.
//!
//! Widths are slot widths: the cell content plus one space of padding on each
//! side. Border and separator characters are not part of any slot.

use tracing::{debug, trace};

use crate::table::Table;
use crate::width::{drawn_width, plain_width};
use crate::wrap::wrapped_line_count;

/// Smallest slot width a column is ever given.
pub const COLUMN_FLOOR: usize = 3;

/// Horizontal padding included in every slot.
pub const CELL_PADDING: usize = 2;

/// Widths and heights for one layout pass over a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub widths: Vec<usize>,
    pub header_height: usize,
    pub row_heights: Vec<usize>,
}

impl TableLayout {
    pub fn compute(table: &Table, terminal_width: usize) -> Self {
        let widths = allocate(&table.headers, &table.rows, terminal_width);
        let header_height = row_height(&table.headers, &widths);
        let row_heights = table
            .rows
            .iter()
            .map(|row| row_height(row, &widths))
            .collect();
        Self {
            widths,
            header_height,
            row_heights,
        }
    }

    /// Columns drawn including borders: every slot plus `n + 1` separators.
    pub fn total_width(&self) -> usize {
        self.widths.iter().sum::<usize>() + self.widths.len() + 1
    }
}

/// Slot width per column.
///
/// Columns keep their natural width when the table fits; the table is never
/// stretched to fill the terminal. Otherwise every column is scaled by
/// `terminal_width / total`, where `total` includes the `n + 1` border
/// characters, and clamped to [`COLUMN_FLOOR`]. Borders are not scaled, so a
/// scaled table can overflow by fewer than `n + 1` columns; the floor can push
/// it further when there are many columns. The floor also applies to a fitting
/// table with an all-empty column.
pub fn allocate(headers: &[String], rows: &[Vec<String>], terminal_width: usize) -> Vec<usize> {
    let natural: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let max_body = rows
                .iter()
                .map(|row| row.get(i).map_or(0, |cell| natural_width(cell)))
                .max()
                .unwrap_or(0);
            natural_width(header).max(max_body) + CELL_PADDING
        })
        .collect();

    let total = natural.iter().sum::<usize>() + natural.len() + 1;
    if total <= terminal_width {
        debug!(?natural, total, terminal_width, "table fits at natural width");
        return natural.into_iter().map(|w| w.max(COLUMN_FLOOR)).collect();
    }

    let widths: Vec<usize> = natural
        .iter()
        .map(|&w| (w * terminal_width / total).max(COLUMN_FLOOR))
        .collect();
    debug!(?natural, ?widths, total, terminal_width, "scaled table columns");
    widths
}

/// Unpadded natural width of a cell. Markup counts as stripped, but characters
/// the renderer keeps (intraword underscores, empty pairs) still need room.
fn natural_width(cell: &str) -> usize {
    plain_width(cell).max(drawn_width(cell))
}

/// Height of a row: the tallest of its wrapped cells, at least 1.
///
/// Missing trailing cells count as empty.
pub fn row_height(cells: &[String], widths: &[usize]) -> usize {
    widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let cell = cells.get(i).map_or("", String::as_str);
            let lines = wrapped_line_count(cell, w.saturating_sub(CELL_PADDING));
            trace!(column = i, width = w, lines, "cell metrics");
            lines
        })
        .max()
        .unwrap_or(1)
        .max(1)
}
