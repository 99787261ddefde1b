use std::sync::LazyLock;

use ansi_to_tui::IntoText;
use ratatui::text::Line;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::as_24_bit_terminal_escaped;
use tracing::{debug, warn};

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Names accepted by `--theme`, sorted.
pub fn theme_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = THEME_SET.themes.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

fn theme(name: &str) -> &'static Theme {
    if let Some(theme) = THEME_SET.themes.get(name) {
        return theme;
    }
    warn!(theme = name, fallback = DEFAULT_THEME, "unknown code theme");
    &THEME_SET.themes[DEFAULT_THEME]
}

fn syntax(lang: Option<&str>) -> &'static SyntaxReference {
    let ss = &*SYNTAX_SET;
    lang.and_then(|l| ss.find_syntax_by_token(l))
        .unwrap_or_else(|| {
            if let Some(l) = lang {
                debug!(lang = l, "no syntax for fence language");
            }
            ss.find_syntax_plain_text()
        })
}

/// Highlights a fenced block into styled lines, one per source line.
/// Falls back to unstyled lines if the escape output cannot be parsed.
pub fn highlight_code(code: &str, lang: Option<&str>, theme_name: &str) -> Vec<Line<'static>> {
    let ss = &*SYNTAX_SET;
    let mut h = HighlightLines::new(syntax(lang), theme(theme_name));

    let mut ansi = String::new();
    for line in code.lines() {
        let ranges = h.highlight_line(line, ss).unwrap_or_default();
        ansi.push_str(&as_24_bit_terminal_escaped(&ranges, false));
        ansi.push('\n');
    }
    ansi.push_str("\x1b[0m");

    match ansi.into_text() {
        Ok(text) => text.lines.into_iter().take(code.lines().count()).collect(),
        Err(err) => {
            debug!(?err, "falling back to plain code lines");
            code.lines().map(|l| Line::raw(l.to_string())).collect()
        }
    }
}
