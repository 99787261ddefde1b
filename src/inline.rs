//! Inline markup scanner and span renderer.
//!
//! `scan` splits a fragment into plain text, marked text and delimiters in a
//! single left-to-right pass. Marked content is never re-scanned, so nested
//! markup shows up literally inside its outer pair.
//!
//! Measuring and drawing differ in two places. Width measurement strips `_x_`
//! anywhere and empty pairs like `****`. The renderer keeps underscores that
//! touch a word (`MAX_RETRY_COUNT`) and keeps empty pairs literal, so no
//! visible character is ever dropped. Column sizing takes the wider of the
//! two and row heights come from the rendered rows, so the grid stays aligned.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Bold,
    Italic,
    Strike,
    Code,
    Underline,
    Link,
}

impl Markup {
    pub fn style(self) -> Style {
        match self {
            Markup::Bold => Style::default().add_modifier(Modifier::BOLD),
            Markup::Italic => Style::default().add_modifier(Modifier::ITALIC),
            Markup::Strike => Style::default().add_modifier(Modifier::CROSSED_OUT),
            Markup::Code => Style::default().bg(Color::Indexed(239)),
            Markup::Underline => Style::default().add_modifier(Modifier::UNDERLINED),
            Markup::Link => Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Plain(&'a str),
    Marked(Markup, &'a str),
    Delimiter(&'a str),
}

/// Symmetric or tag-style pairs, tried in this order before links and the
/// single-character emphasis markers.
const PAIRS: &[(&str, &str, Markup)] = &[
    ("**", "**", Markup::Bold),
    ("~~", "~~", Markup::Strike),
    ("<u>", "</u>", Markup::Underline),
    ("`", "`", Markup::Code),
];

const SINGLE: &[(&str, Markup)] = &[("*", Markup::Italic), ("_", Markup::Italic)];

/// A matched construct starting at the current position: the tokens it
/// produces and how many bytes it consumed.
struct Match<'a> {
    tokens: Vec<Token<'a>>,
    len: usize,
}

/// Which markup a scan recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Width measurement: `_` pairs anywhere, empty pairs stripped.
    Measure,
    /// Drawing: `_` pairs only at word boundaries, empty pairs kept.
    Render,
}

/// Tokens used for width measurement.
pub fn scan(text: &str) -> Vec<Token<'_>> {
    scan_with(text, Mode::Measure)
}

/// Tokens as drawn by [`render_inline`].
pub fn scan_rendered(text: &str) -> Vec<Token<'_>> {
    scan_with(text, Mode::Render)
}

fn scan_with(text: &str, mode: Mode) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let prev = text[..pos].chars().next_back();
        match match_at(rest, prev, mode) {
            Some(m) => {
                if plain_start < pos {
                    tokens.push(Token::Plain(&text[plain_start..pos]));
                }
                tokens.extend(m.tokens);
                pos += m.len;
                plain_start = pos;
            }
            None => {
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if plain_start < text.len() {
        tokens.push(Token::Plain(&text[plain_start..]));
    }

    tokens
}

fn match_at(rest: &str, prev: Option<char>, mode: Mode) -> Option<Match<'_>> {
    // Pairs never span a line break.
    let line = rest.split('\n').next().unwrap_or(rest);
    let allow_empty = mode == Mode::Measure;

    for &(open, close, markup) in PAIRS {
        if let Some(m) = match_pair(line, open, close, markup, allow_empty) {
            return Some(m);
        }
    }

    if let Some(m) = match_link(line, allow_empty) {
        return Some(m);
    }

    SINGLE.iter().find_map(|&(marker, markup)| {
        let m = match_pair(line, marker, marker, markup, allow_empty)?;
        if marker == "_" && mode == Mode::Render && !at_word_boundary(prev, &line[m.len..]) {
            return None;
        }
        Some(m)
    })
}

fn at_word_boundary(prev: Option<char>, after: &str) -> bool {
    let touches = |c: Option<char>| c.is_some_and(char::is_alphanumeric);
    !touches(prev) && !touches(after.chars().next())
}

fn match_pair<'a>(
    line: &'a str,
    open: &str,
    close: &str,
    markup: Markup,
    allow_empty: bool,
) -> Option<Match<'a>> {
    let after_open = line.strip_prefix(open)?;
    let inner_len = after_open.find(close)?;
    if inner_len == 0 && !allow_empty {
        return None;
    }
    let inner_start = open.len();
    let inner_end = inner_start + inner_len;
    let end = inner_end + close.len();
    Some(Match {
        tokens: vec![
            Token::Delimiter(&line[..inner_start]),
            Token::Marked(markup, &line[inner_start..inner_end]),
            Token::Delimiter(&line[inner_end..end]),
        ],
        len: end,
    })
}

fn match_link(line: &str, allow_empty: bool) -> Option<Match<'_>> {
    let after_bracket = line.strip_prefix('[')?;
    let label_len = after_bracket.find("](")?;
    if label_len == 0 && !allow_empty {
        return None;
    }
    let label_end = 1 + label_len;
    let url_start = label_end + 2;
    let url_len = line[url_start..].find(')')?;
    let end = url_start + url_len + 1;
    Some(Match {
        tokens: vec![
            Token::Delimiter(&line[..1]),
            Token::Marked(Markup::Link, &line[1..label_end]),
            Token::Delimiter(&line[label_end..end]),
        ],
        len: end,
    })
}

/// Renders a fragment into styled spans with every delimiter removed.
pub fn render_inline(text: &str, base: Style) -> Vec<Span<'static>> {
    scan_rendered(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Plain(t) => Some(Span::styled(t.to_string(), base)),
            Token::Marked(markup, t) => Some(Span::styled(t.to_string(), base.patch(markup.style()))),
            Token::Delimiter(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn visible(text: &str) -> String {
        render_inline(text, Style::default())
            .iter()
            .map(|s| s.content.as_ref())
            .collect()
    }

    #[test]
    fn test_scan_plain() {
        assert_eq!(scan("hello"), vec![Token::Plain("hello")]);
        assert_eq!(scan(""), Vec::<Token>::new());
    }

    #[test]
    fn test_scan_bold_in_sentence() {
        assert_eq!(
            scan("a **b** c"),
            vec![
                Token::Plain("a "),
                Token::Delimiter("**"),
                Token::Marked(Markup::Bold, "b"),
                Token::Delimiter("**"),
                Token::Plain(" c"),
            ]
        );
    }

    #[test]
    fn test_scan_link_keeps_label() {
        assert_eq!(
            scan("[docs](https://x.io)"),
            vec![
                Token::Delimiter("["),
                Token::Marked(Markup::Link, "docs"),
                Token::Delimiter("](https://x.io)"),
            ]
        );
    }

    #[test]
    fn test_scan_does_not_rescan_inner() {
        assert_eq!(
            scan("**a *b* c**"),
            vec![
                Token::Delimiter("**"),
                Token::Marked(Markup::Bold, "a *b* c"),
                Token::Delimiter("**"),
            ]
        );
    }

    #[test]
    fn test_scan_pairs_stop_at_newline() {
        assert_eq!(scan("*a\nb*"), vec![Token::Plain("*a\nb*")]);
    }

    #[test]
    fn test_render_inline_strips_delimiters() {
        assert_eq!(visible("**Bold**"), "Bold");
        assert_eq!(visible("*Italic*"), "Italic");
        assert_eq!(visible("`Code`"), "Code");
        assert_eq!(visible("~~Strike~~"), "Strike");
        assert_eq!(visible("[Link](url)"), "Link");
        assert_eq!(visible("<u>Underline</u>"), "Underline");
        assert_eq!(visible("_Italic_"), "Italic");
    }

    #[test]
    fn test_render_keeps_intraword_underscores() {
        assert_eq!(visible("MAX_RETRY_COUNT"), "MAX_RETRY_COUNT");
        assert_eq!(visible("snake_case_name"), "snake_case_name");
        assert_eq!(visible("call _now_ please"), "call now please");
        assert_eq!(visible("(_x_)"), "(x)");
    }

    #[test]
    fn test_measure_strips_intraword_underscores() {
        assert_eq!(
            scan("a_b_c"),
            vec![
                Token::Plain("a"),
                Token::Delimiter("_"),
                Token::Marked(Markup::Italic, "b"),
                Token::Delimiter("_"),
                Token::Plain("c"),
            ]
        );
    }

    #[test]
    fn test_empty_pairs_measured_as_nothing_but_drawn_literally() {
        assert_eq!(
            scan("****"),
            vec![
                Token::Delimiter("**"),
                Token::Marked(Markup::Bold, ""),
                Token::Delimiter("**"),
            ]
        );
        assert_eq!(visible("****"), "****");
        assert_eq!(visible("``"), "``");
        assert_eq!(visible("[](u)"), "[](u)");
    }

    #[test]
    fn test_render_inline_styles() {
        let spans = render_inline("**b** `c` [l](u)", Style::default());
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[2].style.bg, Some(Color::Indexed(239)));
        assert_eq!(spans[4].style.fg, Some(Color::Blue));
    }

    #[test]
    fn test_render_inline_patches_base_style() {
        let base = Style::default().fg(Color::Cyan);
        let spans = render_inline("*x*", base);
        assert_eq!(spans[0].style.fg, Some(Color::Cyan));
        assert!(spans[0].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_unmatched_markup_is_literal() {
        assert_eq!(visible("2 * 3"), "2 * 3");
        assert_eq!(visible("`open"), "`open");
        assert_eq!(visible("[x]"), "[x]");
    }
}
