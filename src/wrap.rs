//! Hard wrapping of cell text into fixed-width rows.
//!
//! A cell is first split on explicit breaks (newlines and `<br>` tags), then
//! every segment is filled grapheme by grapheme into rows of at most `width`
//! columns. Row counting and row rendering share `wrap_cell`, so a height
//! computed up front always matches what the grid draws.

use ratatui::style::Style;
use ratatui::text::Span;
use unicode_segmentation::UnicodeSegmentation;

use crate::inline::render_inline;
use crate::width::grapheme_width;

/// One wrapped row of a cell.
pub type CellRow = Vec<Span<'static>>;

/// Splits on `\n` and `<br>`, `<br/>`, `<BR />` and similar.
pub fn split_breaks(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let break_len = if rest.starts_with('\n') {
            Some(1)
        } else {
            br_tag_len(rest)
        };

        match break_len {
            Some(len) => {
                segments.push(text[start..pos].trim_end_matches('\r'));
                pos += len;
                start = pos;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }

    segments.push(text[start..].trim_end_matches('\r'));
    segments
}

/// Byte length of a `<br\s*/?>` tag at the start of `s`, ignoring case.
fn br_tag_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() < 4 || bytes[0] != b'<' || !bytes[1..3].eq_ignore_ascii_case(b"br") {
        return None;
    }
    let mut i = 3;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    (bytes.get(i) == Some(&b'>')).then_some(i + 1)
}

/// Wraps `text` into rows no wider than `width` columns.
///
/// Inline markup is resolved per segment and every row carries `base` patched
/// with the markup style. A zero width yields a single unwrapped row.
pub fn wrap_cell(text: &str, width: usize, base: Style) -> Vec<CellRow> {
    if width == 0 {
        return vec![
            split_breaks(text)
                .into_iter()
                .flat_map(|segment| render_inline(segment, base))
                .collect(),
        ];
    }

    let mut rows = Vec::new();
    for segment in split_breaks(text) {
        rows.extend(fill_rows(&render_inline(segment, base), width));
    }
    rows
}

/// Number of terminal rows `text` occupies at `width` columns, never below 1.
///
/// This is the row count [`wrap_cell`] produces, which can exceed
/// `ceil(width_of_text / width)` when a wide glyph does not fit the rest of a row.
pub fn wrapped_line_count(text: &str, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    wrap_cell(text, width, Style::default()).len().max(1)
}

fn fill_rows(spans: &[Span<'static>], width: usize) -> Vec<CellRow> {
    let mut rows = Vec::new();
    let mut current: Vec<(&str, Style)> = Vec::new();
    let mut current_width = 0;

    for span in spans {
        for grapheme in span.content.graphemes(true) {
            let gw = grapheme_width(grapheme);
            if current_width > 0 && current_width + gw > width {
                rows.push(coalesce(&current));
                current.clear();
                current_width = 0;
            }
            current.push((grapheme, span.style));
            current_width += gw;
        }
    }

    // An empty segment still takes a row.
    if !current.is_empty() || rows.is_empty() {
        rows.push(coalesce(&current));
    }

    rows
}

fn coalesce(graphemes: &[(&str, Style)]) -> CellRow {
    let mut spans: CellRow = Vec::new();
    let mut buf = String::new();
    let mut cur_style = Style::default();

    for &(g, style) in graphemes {
        if !buf.is_empty() && style != cur_style {
            spans.push(Span::styled(std::mem::take(&mut buf), cur_style));
        }
        cur_style = style;
        buf.push_str(g);
    }

    if !buf.is_empty() {
        spans.push(Span::styled(buf, cur_style));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::width::display_width;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn row_text(row: &CellRow) -> String {
        row.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_split_breaks_variants() {
        assert_eq!(split_breaks("a<br>b"), vec!["a", "b"]);
        assert_eq!(split_breaks("a<br/>b<BR />c"), vec!["a", "b", "c"]);
        assert_eq!(split_breaks("a\nb\r\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_breaks("a<br  >b"), vec!["a", "b"]);
    }

    #[test]
    fn test_split_breaks_not_a_tag() {
        assert_eq!(split_breaks("<bra>"), vec!["<bra>"]);
        assert_eq!(split_breaks("<br"), vec!["<br"]);
        assert_eq!(split_breaks("<b>x</b>"), vec!["<b>x</b>"]);
    }

    #[test]
    fn test_split_breaks_keeps_empty_segments() {
        assert_eq!(split_breaks("<br>"), vec!["", ""]);
        assert_eq!(split_breaks(""), vec![""]);
    }

    #[test]
    fn test_count_zero_width_is_one() {
        assert_eq!(wrapped_line_count("anything at all", 0), 1);
        assert_eq!(wrapped_line_count("", 0), 1);
    }

    #[test]
    fn test_count_ceil_division() {
        assert_eq!(wrapped_line_count("abcdef", 3), 2);
        assert_eq!(wrapped_line_count("abcdefg", 3), 3);
        assert_eq!(wrapped_line_count("abc", 10), 1);
        assert_eq!(wrapped_line_count("", 10), 1);
    }

    #[test]
    fn test_count_breaks() {
        assert_eq!(wrapped_line_count("Line 1<br>Line 2<br>Line 3", 40), 3);
        assert_eq!(wrapped_line_count("Line 1\nLine 2<br>Line 3", 40), 3);
        assert_eq!(wrapped_line_count("<br><br>", 40), 3);
    }

    #[test]
    fn test_count_ignores_markup() {
        assert_eq!(wrapped_line_count("**abcd**", 4), 1);
        assert_eq!(wrapped_line_count("[abcd](https://example.com)", 4), 1);
    }

    #[test]
    fn test_wide_graphemes_never_split() {
        let rows = wrap_cell("中中中", 3, Style::default());
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row_text(row), "中");
        }
    }

    #[test]
    fn test_wrap_cell_content() {
        let rows = wrap_cell("hello world", 5, Style::default());
        let texts: Vec<String> = rows.iter().map(row_text).collect();
        assert_eq!(texts, vec!["hello", " worl", "d"]);
    }

    #[test]
    fn test_wide_glyphs_do_not_split_across_rows() {
        // 6 columns of text at width 3: each glyph needs its own row
        assert_eq!(wrapped_line_count("中中中", 3), 3);
        let rows = wrap_cell("中中中", 3, Style::default());
        assert_eq!(rows.iter().map(row_text).collect::<Vec<_>>(), vec!["中", "中", "中"]);
    }

    #[test]
    fn test_wrap_cell_styles_survive_row_break() {
        let rows = wrap_cell("**abcdef**", 3, Style::default());
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert!(row[0].style.add_modifier.contains(ratatui::style::Modifier::BOLD));
        }
    }

    proptest! {
        #[test]
        fn prop_rows_fit_and_match_count(text in "[a-z *_`~<>\\[\\]()中]{0,60}", width in 1usize..20) {
            let rows = wrap_cell(&text, width, Style::default());
            prop_assert_eq!(rows.len(), wrapped_line_count(&text, width));
            for row in &rows {
                prop_assert!(display_width(&row_text(row)) <= width.max(2));
            }
        }

        #[test]
        fn prop_narrow_text_is_ceil_of_drawn_width(text in "[a-z *_]{0,60}", width in 1usize..20) {
            let expected = split_breaks(&text)
                .iter()
                .map(|s| display_width(&row_text(&render_inline(s, Style::default()))))
                .map(|w| w.div_ceil(width).max(1))
                .sum::<usize>();
            prop_assert_eq!(wrapped_line_count(&text, width), expected);
        }
    }
}
