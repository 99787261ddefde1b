mod watch;

use std::fs::File;
use std::io::{self, IsTerminal, Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::text::Text;
use ratatui::widgets::{Paragraph, Wrap};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use mdgrid::highlight::{DEFAULT_THEME, theme_names};
use mdgrid::{RenderOptions, ansi, render_markdown};

/// How long a changed file must stay quiet before it is shown as settled.
const SETTLE_AFTER: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

/// View Markdown in the terminal with box-drawn tables.
#[derive(Debug, Parser)]
#[command(name = "mdgrid", version, about)]
struct Cli {
    /// Markdown file to view; `-` or nothing reads stdin and implies --dump
    path: Option<PathBuf>,

    /// Render once to stdout and exit
    #[arg(long)]
    dump: bool,

    /// Render width in columns (defaults to the terminal width)
    #[arg(short, long, env = "MDGRID_WIDTH")]
    width: Option<u16>,

    /// Syntax theme for fenced code blocks
    #[arg(long, env = "MDGRID_THEME", default_value = DEFAULT_THEME)]
    theme: String,

    /// Print the available code themes and exit
    #[arg(long)]
    list_themes: bool,

    /// Colour the --dump output
    #[arg(long, env = "MDGRID_COLOR", value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    /// Write logs to this file (interactive mode logs nowhere else)
    #[arg(long, env = "MDGRID_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn reads_stdin(&self) -> bool {
        self.path.as_deref().is_none_or(|p| p == Path::new("-"))
    }

    fn options(&self, width: u16) -> RenderOptions {
        RenderOptions {
            width,
            pending: false,
            code_theme: self.theme.clone(),
        }
    }
}

struct App {
    text: Text<'static>,
    scroll: u16,
    viewport_height: u16,
}

impl App {
    fn max_scroll(&self) -> u16 {
        let content_height = (self.text.height() as u32).min(u16::MAX as u32) as u16;
        content_height.saturating_sub(self.viewport_height)
    }

    fn scroll_down(&mut self, n: u16) {
        self.scroll = self.scroll.saturating_add(n).min(self.max_scroll());
    }

    fn scroll_up(&mut self, n: u16) {
        self.scroll = self.scroll.saturating_sub(n);
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_themes {
        for name in theme_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let dump = cli.dump || cli.reads_stdin();
    init_logging(&cli, dump)?;

    if cli.reads_stdin() {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Cannot read stdin")?;
        return dump_text(&cli, &content);
    }

    let path = cli.path.as_deref().context("Usage: mdgrid [OPTIONS] [PATH]")?;
    let path = path
        .canonicalize()
        .with_context(|| format!("Cannot resolve path: {}", path.display()))?;
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Cannot read {}", path.display()))?;

    if dump {
        return dump_text(&cli, &content);
    }

    view(&cli, &path, content)
}

fn init_logging(cli: &Cli, dump: bool) -> Result<()> {
    let default = if cli.verbose { "mdgrid=debug" } else { "mdgrid=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if dump => builder.with_writer(io::stderr).init(),
        // Anything written to the terminal would tear the alternate screen.
        None => {}
    }
    Ok(())
}

fn dump_text(cli: &Cli, content: &str) -> Result<()> {
    let width = cli
        .width
        .unwrap_or_else(|| crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80));
    let text = render_markdown(content, &cli.options(width));

    let styled = match cli.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal(),
    };
    debug!(width, styled, lines = text.lines.len(), "dumping document");

    let mut out = io::stdout().lock();
    ansi::write_text(&mut out, &text, styled).context("Cannot write to stdout")?;
    out.flush().context("Cannot write to stdout")?;
    Ok(())
}

fn view(cli: &Cli, path: &Path, mut content: String) -> Result<()> {
    install_panic_hook();

    enable_raw_mode().context("Cannot enable raw mode")?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .context("Cannot enter alternate screen")?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let mut options = cli.options(cli.width.unwrap_or(size.width));
    let mut app = App {
        text: render_markdown(&content, &options),
        scroll: 0,
        viewport_height: size.height,
    };
    info!(path = %path.display(), width = options.width, "viewing document");

    let (tx, rx) = mpsc::channel();
    let _watcher = watch::setup(path, tx)?;
    let mut last_change: Option<Instant> = None;

    loop {
        terminal.draw(|f| {
            let area = f.area();
            app.viewport_height = area.height;

            let paragraph = Paragraph::new(app.text.clone())
                .wrap(Wrap { trim: false })
                .scroll((app.scroll, 0));

            f.render_widget(paragraph, area);

            let max = app.max_scroll();
            if max > 0 {
                render_scrollbar(f, area, app.scroll, max);
            }
        })?;

        if rx.try_recv().is_ok() {
            while rx.try_recv().is_ok() {}
            match std::fs::read_to_string(path) {
                Ok(new_content) => {
                    content = new_content;
                    options.pending = true;
                    last_change = Some(Instant::now());
                    app.text = render_markdown(&content, &options);
                    app.clamp_scroll();
                }
                Err(err) => warn!(%err, path = %path.display(), "re-read failed, keeping last render"),
            }
        }

        if last_change.is_some_and(|t| t.elapsed() >= SETTLE_AFTER) {
            last_change = None;
            options.pending = false;
            app.text = render_markdown(&content, &options);
            app.clamp_scroll();
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break
                    }
                    KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
                    KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
                    KeyCode::Char('d') => app.scroll_down(app.viewport_height / 2),
                    KeyCode::Char('u') => app.scroll_up(app.viewport_height / 2),
                    KeyCode::Char('g') => app.scroll = 0,
                    KeyCode::Char('G') => app.scroll = app.max_scroll(),
                    KeyCode::Char(' ') | KeyCode::PageDown => {
                        app.scroll_down(app.viewport_height.saturating_sub(2))
                    }
                    KeyCode::PageUp => {
                        app.scroll_up(app.viewport_height.saturating_sub(2))
                    }
                    _ => {}
                },
                Event::Resize(w, h) => {
                    app.viewport_height = h;
                    if cli.width.is_none() && w != options.width {
                        debug!(width = w, "re-rendering for new width");
                        options.width = w;
                        app.text = render_markdown(&content, &options);
                    }
                    app.clamp_scroll();
                }
                _ => {}
            }
        }
    }

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(LeaveAlternateScreen);
        original(info);
    }));
}

fn render_scrollbar(f: &mut ratatui::Frame, area: Rect, scroll: u16, max_scroll: u16) {
    let track_height = area.height.saturating_sub(1) as f64;
    let pos = (scroll as f64 / max_scroll as f64 * track_height) as u16;

    let x = area.right().saturating_sub(1);
    let y = area.y + pos;

    if y < area.bottom() {
        f.render_widget(Paragraph::new("█"), Rect::new(x, y, 1, 1));
    }
}
