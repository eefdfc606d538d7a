//! Main TUI application logic.

use super::{chart, events, portfolio, Route, Theme};
use crate::services::read_symbols_from_path;
use crate::types::{HistoryInterval, HistoryPeriod, ImageInsight, TickerReport};
use crate::AppState;
use crossterm::{
    event::KeyCode,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame, Terminal,
};
use std::{io, path::PathBuf, time::Duration};
use tracing::{info, warn};

/// Availability probes before the AI explanation is switched off.
const LLM_PROBE_ATTEMPTS: usize = 5;

const DISCLAIMER: &str =
    "Demo prepared by Finsight. For educational/demo purposes only, not financial advice.";

/// Files handed to the UI at launch.
#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    pub symbols_path: Option<PathBuf>,
    pub image_path: Option<PathBuf>,
}

/// A chart image loaded from disk.
pub(super) struct LoadedImage {
    pub label: String,
    pub bytes: Vec<u8>,
}

/// Main TUI application.
pub struct App {
    current_route: Route,
    app_state: AppState,
    theme: Theme,
    symbols: Vec<String>,
    symbols_label: Option<String>,
    image: Option<LoadedImage>,
    period: HistoryPeriod,
    interval: HistoryInterval,
    reports: Vec<TickerReport>,
    image_insight: Option<ImageInsight>,
    selected: usize,
    llm_enabled: bool,
    status: Option<String>,
    analysis_requested: bool,
    should_quit: bool,
}

/// Next entry after `current`, wrapping; unknown values restart the cycle.
fn cycle<T: Copy + PartialEq>(options: &[T], current: T) -> T {
    let next = options
        .iter()
        .position(|o| *o == current)
        .map_or(0, |i| (i + 1) % options.len());
    options[next]
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl App {
    /// Create a new TUI application, reading the launch files.
    pub fn new(app_state: AppState, options: TuiOptions, llm_enabled: bool) -> Self {
        let defaults = &app_state.config.analysis;
        let period = if HistoryPeriod::selectable().contains(&defaults.period) {
            defaults.period
        } else {
            HistoryPeriod::selectable()[0]
        };
        let interval = if HistoryInterval::selectable().contains(&defaults.interval) {
            defaults.interval
        } else {
            HistoryInterval::selectable()[0]
        };

        let mut app = Self {
            current_route: Route::Portfolio,
            app_state,
            theme: Theme::default(),
            symbols: Vec::new(),
            symbols_label: None,
            image: None,
            period,
            interval,
            reports: Vec::new(),
            image_insight: None,
            selected: 0,
            llm_enabled,
            status: None,
            analysis_requested: false,
            should_quit: false,
        };

        if let Some(path) = options.symbols_path {
            match read_symbols_from_path(&path) {
                Ok(symbols) => {
                    info!("Loaded {} symbols from {}", symbols.len(), path.display());
                    app.symbols = symbols;
                    app.symbols_label = Some(file_label(&path));
                }
                Err(e) => {
                    warn!("Failed to read symbols from {}: {}", path.display(), e);
                    app.status = Some(format!("Could not read {}: {}", path.display(), e));
                }
            }
        }

        if let Some(path) = options.image_path {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    app.image = Some(LoadedImage {
                        label: file_label(&path),
                        bytes,
                    })
                }
                Err(e) => {
                    warn!("Failed to read chart image {}: {}", path.display(), e);
                    app.status = Some(format!("Could not read {}: {}", path.display(), e));
                }
            }
        }

        app
    }

    /// Handle an event.
    pub fn handle_event(&mut self, event: events::Event) {
        let key = match event {
            events::Event::Key(key) => key,
            events::Event::Tick | events::Event::Resize(_, _) => return,
        };

        if events::is_quit(&key) {
            self.should_quit = true;
            return;
        }

        for route in Route::all() {
            if events::is_key(&key, KeyCode::Char(route.key())) {
                self.current_route = route;
                return;
            }
        }

        if events::is_key(&key, KeyCode::Tab) {
            self.current_route = match self.current_route {
                Route::Portfolio => Route::Chart,
                Route::Chart => Route::Portfolio,
            };
        } else if events::is_key(&key, KeyCode::Char('p')) {
            self.period = cycle(&HistoryPeriod::selectable(), self.period);
        } else if events::is_key(&key, KeyCode::Char('i')) {
            self.interval = cycle(&HistoryInterval::selectable(), self.interval);
        } else if events::is_key(&key, KeyCode::Char('a')) || events::is_key(&key, KeyCode::Enter) {
            self.request_analysis();
        } else if events::is_key(&key, KeyCode::Down) || events::is_key(&key, KeyCode::Char('j')) {
            if self.selected + 1 < self.reports.len() {
                self.selected += 1;
            }
        } else if events::is_key(&key, KeyCode::Up) || events::is_key(&key, KeyCode::Char('k')) {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    fn request_analysis(&mut self) {
        if self.symbols.is_empty() {
            self.status = Some("Please provide a CSV file with stock symbols.".to_string());
            return;
        }
        self.analysis_requested = true;
        self.status = Some(format!(
            "Analyzing {} tickers ({} / {})...",
            self.symbols.len(),
            self.period,
            self.interval
        ));
    }

    /// Consume a pending analysis request.
    pub fn take_analysis_request(&mut self) -> bool {
        std::mem::take(&mut self.analysis_requested)
    }

    /// Run the chart and portfolio analysis with the current selection.
    pub async fn run_analysis(&mut self) {
        let pipeline = self.app_state.pipeline.clone();

        if let Some(image) = &self.image {
            let ticker = self.symbols.first().map(String::as_str);
            self.image_insight = Some(pipeline.analyze_image_and_data(&image.bytes, ticker).await);
        }

        self.reports = pipeline
            .analyze_portfolio_with(&self.symbols, self.period, self.interval)
            .await;
        self.selected = 0;

        let with_data = self.reports.iter().filter(|r| r.has_data()).count();
        self.status = Some(format!(
            "Analyzed {} tickers, {} with data ({} / {})",
            self.reports.len(),
            with_data,
            self.period,
            self.interval
        ));
    }

    /// Check if the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn route(&self) -> Route {
        self.current_route
    }

    pub fn period(&self) -> HistoryPeriod {
        self.period
    }

    pub fn interval(&self) -> HistoryInterval {
        self.interval
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn reports(&self) -> &[TickerReport] {
        &self.reports
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn image_insight(&self) -> Option<&ImageInsight> {
        self.image_insight.as_ref()
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm_enabled
    }

    pub(super) fn selected_report(&self) -> Option<&TickerReport> {
        self.reports.get(self.selected)
    }

    pub(super) fn symbols_label(&self) -> Option<&str> {
        self.symbols_label.as_deref()
    }

    pub(super) fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    /// Render the TUI.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Content
                Constraint::Length(4), // Status bar
            ])
            .split(area);

        self.render_tabs(frame, chunks[0]);

        match self.current_route {
            Route::Portfolio => portfolio::render(frame, chunks[1], self, &self.theme),
            Route::Chart => chart::render(frame, chunks[1], self, &self.theme),
        }

        self.render_status_bar(frame, chunks[2]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let routes = Route::all();
        let titles: Vec<Line> = routes
            .iter()
            .map(|r| {
                Line::from(vec![
                    Span::styled(format!("[{}] ", r.key()), self.theme.muted()),
                    Span::raw(r.name()),
                ])
            })
            .collect();

        let selected = routes
            .iter()
            .position(|r| *r == self.current_route)
            .unwrap_or(0);

        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Finsight"))
            .select(selected)
            .style(self.theme.tab_inactive())
            .highlight_style(self.theme.tab_active());

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let keys = Line::from(vec![
            Span::styled("period ", self.theme.muted()),
            Span::styled(self.period.as_str(), self.theme.title()),
            Span::styled(" [p]", self.theme.muted()),
            Span::raw(" | "),
            Span::styled("interval ", self.theme.muted()),
            Span::styled(self.interval.as_str(), self.theme.title()),
            Span::styled(" [i]", self.theme.muted()),
            Span::raw(" | "),
            Span::styled("a", self.theme.muted()),
            Span::raw(" analyze | "),
            Span::styled("↑/↓", self.theme.muted()),
            Span::raw(" select | "),
            Span::styled("q", self.theme.muted()),
            Span::raw(" quit"),
        ]);

        let second = match &self.status {
            Some(status) => Line::from(Span::styled(status.as_str(), self.theme.warning())),
            None => Line::from(Span::styled(DISCLAIMER, self.theme.muted())),
        };

        let bar = Paragraph::new(vec![keys, second]).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.border()),
        );
        frame.render_widget(bar, area);
    }
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let mut event_handler = events::EventHandler::new(Duration::from_millis(250));

    loop {
        terminal.draw(|f| app.render(f))?;

        if app.take_analysis_request() {
            app.run_analysis().await;
            continue;
        }

        if let Some(event) = event_handler.next().await {
            app.handle_event(event);
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

/// Run the TUI application.
pub async fn run_tui(app_state: AppState, options: TuiOptions) -> io::Result<()> {
    // Probe before taking over the terminal
    let llm_enabled = app_state.pipeline.llm().probe(LLM_PROBE_ATTEMPTS).await;
    let mut app = App::new(app_state, options, llm_enabled);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
