//! Box-drawing grid for a laid out table.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::layout::{CELL_PADDING, TableLayout};
use crate::table::Table;
use crate::width::display_width;
use crate::wrap::wrap_cell;

fn border_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn header_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

/// Lays out and draws `table` for a terminal `terminal_width` columns wide.
pub fn render_table(table: &Table, terminal_width: usize) -> Vec<Line<'static>> {
    let layout = TableLayout::compute(table, terminal_width);
    render(table, &layout.widths, &layout.row_heights, layout.header_height)
}

/// Draws the grid from precomputed widths and heights.
///
/// Every row block is `height + 1` lines tall; the extra blank line keeps
/// dense tables readable. Cell content is top-left aligned.
pub fn render(
    table: &Table,
    widths: &[usize],
    row_heights: &[usize],
    header_height: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(build_border(widths, '┌', '┬', '┐'));
    lines.extend(build_row(&table.headers, widths, header_height, header_style()));
    lines.push(build_border(widths, '├', '┼', '┤'));

    for (i, row) in table.rows.iter().enumerate() {
        let height = row_heights.get(i).copied().unwrap_or(1);
        lines.extend(build_row(row, widths, height, Style::default()));
    }

    lines.push(build_border(widths, '└', '┴', '┘'));
    lines
}

fn build_border(widths: &[usize], left: char, mid: char, right: char) -> Line<'static> {
    let joiner = format!("─{mid}─");
    let segments: Vec<String> = widths
        .iter()
        .map(|&w| "─".repeat(w.saturating_sub(CELL_PADDING)))
        .collect();
    Line::styled(
        format!("{left}─{}─{right}", segments.join(&joiner)),
        border_style(),
    )
}

fn build_row(
    cells: &[String],
    widths: &[usize],
    height: usize,
    cell_style: Style,
) -> Vec<Line<'static>> {
    let wrapped: Vec<_> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let cell = cells.get(i).map_or("", String::as_str);
            wrap_cell(cell, w.saturating_sub(CELL_PADDING), cell_style)
        })
        .collect();

    (0..=height)
        .map(|vrow| {
            let mut spans = vec![Span::styled("│ ", border_style())];

            for (i, &w) in widths.iter().enumerate() {
                let content_width = w.saturating_sub(CELL_PADDING);
                let cell_line = if vrow < height { wrapped[i].get(vrow) } else { None };
                let used = cell_line.map_or(0, |line| {
                    line.iter().map(|s| display_width(&s.content)).sum()
                });

                if let Some(line) = cell_line {
                    spans.extend(line.iter().cloned());
                }
                let padding = content_width.saturating_sub(used);
                if padding > 0 {
                    spans.push(Span::raw(" ".repeat(padding)));
                }

                let sep = if i + 1 < widths.len() { " │ " } else { " │" };
                spans.push(Span::styled(sep, border_style()));
            }

            Line::from(spans)
        })
        .collect()
}
