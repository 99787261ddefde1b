//! Terminal display width of text.
//!
//! Everything that measures a string for layout goes through this module so
//! that column budgets, wrapping, and padding all agree on what a column is.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::inline::{Token, scan, scan_rendered};

/// Width of a single grapheme cluster in terminal columns.
pub fn grapheme_width(grapheme: &str) -> usize {
    UnicodeWidthStr::width(grapheme)
}

/// Display width of `text`, measured one grapheme cluster at a time.
///
/// Wide characters (CJK, most emoji) count 2, combining marks fold into the
/// cluster they modify.
pub fn display_width(text: &str) -> usize {
    text.graphemes(true).map(grapheme_width).sum()
}

/// Display width of `text` once inline markup delimiters are removed.
///
/// `**bold**` measures 4, `[label](url)` measures the label only. Malformed
/// or unmatched markup is counted literally.
pub fn plain_width(text: &str) -> usize {
    visible_width(&scan(text))
}

/// Display width of `text` as the cell renderer draws it.
///
/// Never below [`plain_width`] in practice: it differs only where the renderer
/// keeps characters, such as the underscores in `MAX_RETRY_COUNT`.
pub fn drawn_width(text: &str) -> usize {
    visible_width(&scan_rendered(text))
}

fn visible_width(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .map(|token| match token {
            Token::Plain(t) | Token::Marked(_, t) => display_width(t),
            Token::Delimiter(_) => 0,
        })
        .sum()
}
