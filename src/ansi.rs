//! Writes rendered text to a byte stream, with or without SGR escapes.

use std::io::{self, Write};

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;

const MODIFIER_CODES: [(Modifier, &str); 5] = [
    (Modifier::BOLD, "1"),
    (Modifier::DIM, "2"),
    (Modifier::ITALIC, "3"),
    (Modifier::UNDERLINED, "4"),
    (Modifier::CROSSED_OUT, "9"),
];

/// One output line per text line. Styled spans are wrapped in an SGR
/// sequence and a reset when `styled` is set.
pub fn write_text(out: &mut impl Write, text: &Text, styled: bool) -> io::Result<()> {
    for line in &text.lines {
        for span in &line.spans {
            match sgr_params(line.style.patch(span.style)).filter(|_| styled) {
                Some(params) => write!(out, "\x1b[{params}m{}\x1b[0m", span.content)?,
                None => write!(out, "{}", span.content)?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn sgr_params(style: Style) -> Option<String> {
    let mut params: Vec<String> = Vec::new();

    if let Some(fg) = style.fg.and_then(color_to_ansi_fg) {
        params.push(fg);
    }
    if let Some(bg) = style.bg.and_then(color_to_ansi_bg) {
        params.push(bg);
    }
    for (flag, code) in MODIFIER_CODES {
        if style.add_modifier.contains(flag) {
            params.push(code.to_string());
        }
    }

    (!params.is_empty()).then(|| params.join(";"))
}

fn basic_color_index(color: Color) -> Option<u8> {
    match color {
        Color::Black => Some(0),
        Color::Red => Some(1),
        Color::Green => Some(2),
        Color::Yellow => Some(3),
        Color::Blue => Some(4),
        Color::Magenta => Some(5),
        Color::Cyan => Some(6),
        Color::White | Color::Gray => Some(7),
        _ => None,
    }
}

fn bright_color_index(color: Color) -> Option<u8> {
    match color {
        Color::DarkGray => Some(0),
        Color::LightRed => Some(1),
        Color::LightGreen => Some(2),
        Color::LightYellow => Some(3),
        Color::LightBlue => Some(4),
        Color::LightMagenta => Some(5),
        Color::LightCyan => Some(6),
        _ => None,
    }
}

fn color_to_ansi_fg(color: Color) -> Option<String> {
    if let Some(i) = basic_color_index(color) {
        return Some(format!("{}", 30 + i));
    }
    if let Some(i) = bright_color_index(color) {
        return Some(format!("{}", 90 + i));
    }
    match color {
        Color::Rgb(r, g, b) => Some(format!("38;2;{r};{g};{b}")),
        Color::Indexed(i) => Some(format!("38;5;{i}")),
        _ => None,
    }
}

fn color_to_ansi_bg(color: Color) -> Option<String> {
    if let Some(i) = basic_color_index(color) {
        return Some(format!("{}", 40 + i));
    }
    if let Some(i) = bright_color_index(color) {
        return Some(format!("{}", 100 + i));
    }
    match color {
        Color::Rgb(r, g, b) => Some(format!("48;2;{r};{g};{b}")),
        Color::Indexed(i) => Some(format!("48;5;{i}")),
        _ => None,
    }
}
