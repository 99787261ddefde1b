use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::blocks::{Block, split_blocks};
use crate::grid::render_table;
use crate::highlight::{DEFAULT_THEME, highlight_code};
use crate::inline::Markup;

/// Inputs of a render pass besides the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Terminal width in columns.
    pub width: u16,
    /// The document is still being written; draws a trailing cursor.
    pub pending: bool,
    /// Syntect theme used for fenced code.
    pub code_theme: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 80,
            pending: false,
            code_theme: DEFAULT_THEME.to_string(),
        }
    }
}

const PENDING_CURSOR: &str = "▍";

/// Renders a whole document. The output depends only on `input` and
/// `options`, so it is safe to call on every frame.
pub fn render_markdown(input: &str, options: &RenderOptions) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for block in split_blocks(input) {
        match block {
            Block::Markdown(chunk) => {
                let mut renderer = Renderer::new(options);
                renderer.process(Parser::new_ext(&chunk, markdown_options()));
                lines.extend(renderer.lines);
            }
            Block::Table(table) => {
                lines.extend(render_table(&table, options.width as usize));
                lines.push(Line::default());
            }
            Block::Plain(raw) => {
                lines.extend(raw.into_iter().map(Line::raw));
                lines.push(Line::default());
            }
        }
    }

    if options.pending {
        let cursor = Span::styled(PENDING_CURSOR, Style::default().fg(Color::DarkGray));
        match lines.iter_mut().rev().find(|l| !l.spans.is_empty()) {
            Some(last) => last.spans.push(cursor),
            None => lines.push(Line::from(cursor)),
        }
    }

    Text::from(lines)
}

fn markdown_options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

struct ListState {
    ordered: bool,
    counter: u64,
}

struct Renderer<'o> {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListState>,
    blockquote_depth: usize,
    in_code_block: bool,
    code_lang: Option<String>,
    code_buf: String,
    link_url: String,
    item_paragraph_count: usize,
    options: &'o RenderOptions,
}

impl<'o> Renderer<'o> {
    fn new(options: &'o RenderOptions) -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: vec![Style::default()],
            list_stack: Vec::new(),
            blockquote_depth: 0,
            in_code_block: false,
            code_lang: None,
            code_buf: String::new(),
            link_url: String::new(),
            item_paragraph_count: 0,
            options,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let new = self.current_style().patch(patch);
        self.style_stack.push(new);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn flush_line(&mut self) {
        if !self.spans.is_empty() {
            let spans = std::mem::take(&mut self.spans);
            self.lines.push(Line::from(spans));
        }
    }

    fn push_blank(&mut self) {
        self.flush_line();
        self.lines.push(Line::default());
    }

    fn blockquote_prefix(&self) -> Vec<Span<'static>> {
        (0..self.blockquote_depth)
            .map(|_| Span::styled("│ ", Style::default().fg(Color::DarkGray)))
            .collect()
    }

    fn list_indent(&self) -> String {
        "  ".repeat(self.list_stack.len().saturating_sub(1))
    }

    fn process(&mut self, parser: Parser) {
        for event in parser {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag) => self.end_tag(tag),
                Event::Text(text) => self.text(&text),
                Event::Code(code) => self.inline_code(&code),
                Event::SoftBreak => self.soft_break(),
                Event::HardBreak => self.hard_break(),
                Event::Rule => self.rule(),
                Event::TaskListMarker(checked) => self.task_marker(checked),
                Event::Html(html) => self.raw_html(&html),
                Event::InlineHtml(html) => self.inline_raw_html(&html),
                Event::FootnoteReference(label) => self.footnote_ref(&label),
                Event::InlineMath(math) => self.math(&math),
                Event::DisplayMath(math) => self.display_math(&math),
            }
        }
        self.flush_line();
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let (color, prefix) = match level {
                    pulldown_cmark::HeadingLevel::H1 => (Color::Cyan, "# "),
                    pulldown_cmark::HeadingLevel::H2 => (Color::Green, "## "),
                    pulldown_cmark::HeadingLevel::H3 => (Color::Yellow, "### "),
                    _ => (Color::White, "#### "),
                };
                let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
                self.style_stack.push(style);
                self.spans.push(Span::styled(prefix, style));
            }

            Tag::Paragraph => {
                if !self.list_stack.is_empty() {
                    self.item_paragraph_count += 1;
                    if self.item_paragraph_count > 1 {
                        self.flush_line();
                    }
                } else {
                    self.flush_line();
                }
            }

            Tag::BlockQuote(_) => {
                self.flush_line();
                self.blockquote_depth += 1;
            }

            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(ListState {
                    ordered: start.is_some(),
                    counter: start.unwrap_or(1),
                });
            }

            Tag::Item => {
                self.flush_line();
                self.item_paragraph_count = 0;
                let indent = self.list_indent();
                let mut prefix_spans = self.blockquote_prefix();

                if let Some(list) = self.list_stack.last_mut() {
                    let bullet = if list.ordered {
                        let s = format!("{indent}{}. ", list.counter);
                        list.counter += 1;
                        s
                    } else {
                        let marker = match self.list_stack.len() {
                            1 => "•",
                            2 => "◦",
                            _ => "▪",
                        };
                        format!("{indent}{marker} ")
                    };
                    prefix_spans.push(Span::styled(bullet, Style::default().fg(Color::DarkGray)));
                }
                self.spans = prefix_spans;
            }

            Tag::Emphasis => self.push_style(Markup::Italic.style()),
            Tag::Strong => self.push_style(Markup::Bold.style()),
            Tag::Strikethrough => self.push_style(Markup::Strike.style()),

            Tag::Link { dest_url, .. } => {
                self.push_style(Markup::Link.style());
                self.link_url = dest_url.to_string();
            }

            Tag::CodeBlock(kind) => {
                self.flush_line();
                self.in_code_block = true;
                self.code_lang = match kind {
                    pulldown_cmark::CodeBlockKind::Fenced(lang) => lang
                        .split_whitespace()
                        .next()
                        .filter(|l| !l.is_empty())
                        .map(str::to_string),
                    _ => None,
                };
                self.code_buf.clear();
            }

            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.pop_style();
                self.flush_line();
                self.push_blank();
            }

            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.push_blank();
                }
            }

            TagEnd::BlockQuote(_) => {
                self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
                self.flush_line();
            }

            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.flush_line();
                    self.push_blank();
                }
            }

            TagEnd::Item => {
                self.flush_line();
            }

            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.pop_style();
            }

            TagEnd::Link => {
                self.pop_style();
                let url = std::mem::take(&mut self.link_url);
                self.spans.push(Span::styled(
                    format!(" ({url})"),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            TagEnd::CodeBlock => {
                self.in_code_block = false;
                let code = std::mem::take(&mut self.code_buf);
                let lang = self.code_lang.take();

                let highlighted = highlight_code(&code, lang.as_deref(), &self.options.code_theme);
                let prefix = self.blockquote_prefix();

                for line in highlighted {
                    let mut spans = prefix.clone();
                    spans.push(Span::raw("  "));
                    spans.extend(line.spans);
                    self.lines.push(Line::from(spans));
                }
                self.push_blank();
            }

            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            self.code_buf.push_str(text);
            return;
        }

        if self.blockquote_depth > 0 && self.spans.is_empty() {
            self.spans = self.blockquote_prefix();
        }

        self.spans
            .push(Span::styled(text.to_string(), self.current_style()));
    }

    fn inline_code(&mut self, code: &str) {
        self.spans.push(Span::styled(
            code.to_string(),
            self.current_style().patch(Markup::Code.style()),
        ));
    }

    fn soft_break(&mut self) {
        self.spans.push(Span::raw(" "));
    }

    fn hard_break(&mut self) {
        self.flush_line();
        if self.blockquote_depth > 0 {
            self.spans = self.blockquote_prefix();
        }
    }

    fn rule(&mut self) {
        self.flush_line();
        let w = self.options.width.saturating_sub(2) as usize;
        self.lines.push(Line::styled(
            "─".repeat(w),
            Style::default().fg(Color::DarkGray),
        ));
        self.push_blank();
    }

    fn task_marker(&mut self, checked: bool) {
        let marker = if checked { "[✓] " } else { "[ ] " };
        self.spans.push(Span::styled(
            marker,
            Style::default().fg(if checked { Color::Green } else { Color::DarkGray }),
        ));
    }

    fn raw_html(&mut self, html: &str) {
        self.flush_line();
        for line in html.lines() {
            self.lines.push(Line::styled(
                line.to_string(),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
    }

    fn inline_raw_html(&mut self, html: &str) {
        match html_tag(html).as_deref() {
            Some("u") => self.push_style(Markup::Underline.style()),
            Some("/u") => self.pop_style(),
            Some("br") | Some("br/") => self.hard_break(),
            _ => self.spans.push(Span::styled(
                html.to_string(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        }
    }

    fn footnote_ref(&mut self, label: &str) {
        self.spans.push(Span::styled(
            format!("[{label}]"),
            Style::default().fg(Color::Cyan),
        ));
    }

    fn math(&mut self, math: &str) {
        self.spans.push(Span::styled(
            math.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }

    fn display_math(&mut self, math: &str) {
        self.flush_line();
        self.lines.push(Line::styled(
            math.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
        self.push_blank();
    }
}

/// Lowercased tag name of a simple inline tag such as `<u>`, `</U>` or
/// `<br />`, with whitespace removed.
fn html_tag(html: &str) -> Option<String> {
    let inner = html.strip_prefix('<')?.strip_suffix('>')?;
    let name: String = inner
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    (!name.is_empty()).then_some(name)
}
