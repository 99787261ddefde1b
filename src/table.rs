//! Pipe table detection.

use tracing::debug;

/// A detected table. Every row holds exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }
}

/// Whether `line` contains a `|` that is not backslash-escaped.
pub fn has_unescaped_pipe(line: &str) -> bool {
    unescaped_pipes(line).next().is_some()
}

fn unescaped_pipes(line: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = line.as_bytes();
    bytes.iter().enumerate().filter_map(move |(i, &b)| {
        if b != b'|' {
            return None;
        }
        let backslashes = bytes[..i].iter().rev().take_while(|&&c| c == b'\\').count();
        (backslashes % 2 == 0).then_some(i)
    })
}

/// Splits a row on unescaped pipes into trimmed cells.
///
/// A leading or trailing pipe does not produce an empty edge cell, and `\|`
/// inside a cell becomes a literal `|`.
pub fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let mut cells = Vec::new();
    let mut start = 0;
    for idx in unescaped_pipes(line) {
        cells.push(&line[start..idx]);
        start = idx + 1;
    }
    cells.push(&line[start..]);

    if line.starts_with('|') {
        cells.remove(0);
    }
    if line.len() > 1 && line.ends_with('|') && cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }

    cells
        .into_iter()
        .map(|cell| cell.trim().replace("\\|", "|"))
        .collect()
}

/// A separator row is made only of cells like `---`, `:--`, `--:` or `:-:`.
pub fn is_separator_row(line: &str) -> bool {
    if !has_unescaped_pipe(line) {
        return false;
    }
    let cells = split_row(line);
    !cells.is_empty()
        && cells
            .iter()
            .all(|cell| !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':'))
}

/// Reads `lines` as header, separator and data rows.
///
/// Returns `None` unless the second line is a valid separator; the caller is
/// then expected to show the lines unchanged. Short rows are padded with
/// empty cells and cells past the header width are dropped.
pub fn detect(lines: &[&str]) -> Option<Table> {
    let [header, separator, body @ ..] = lines else {
        return None;
    };

    if !has_unescaped_pipe(header) || !is_separator_row(separator) {
        debug!(lines = lines.len(), "declined table candidate");
        return None;
    }

    let headers = split_row(header);
    if headers.is_empty() {
        return None;
    }

    let rows = body
        .iter()
        .map(|line| {
            let mut cells = split_row(line);
            cells.resize(headers.len(), String::new());
            cells
        })
        .collect();

    let table = Table { headers, rows };
    debug!(
        columns = table.num_columns(),
        rows = table.rows.len(),
        "detected table"
    );
    Some(table)
}
