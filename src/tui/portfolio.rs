//! Portfolio view - per-ticker close chart, rule verdict and AI explanation.

use super::{App, Theme};
use crate::types::{fmt_opt, Direction as Trend, PriceSeries, TickerReport};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Wrap,
    },
    Frame,
};

/// Render the portfolio view.
pub fn render(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(area);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(columns[0]);

    render_tickers(frame, sidebar[0], app, theme);
    render_settings(frame, sidebar[1], app, theme);

    match app.selected_report() {
        Some(report) => render_report(frame, columns[1], report, app.llm_enabled(), theme),
        None => render_placeholder(frame, columns[1], app, theme),
    }
}

fn render_tickers(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let items: Vec<ListItem> = if app.reports().is_empty() {
        app.symbols()
            .iter()
            .map(|s| ListItem::new(Span::styled(s.as_str(), theme.muted())))
            .collect()
    } else {
        app.reports()
            .iter()
            .enumerate()
            .map(|(i, report)| {
                let direction = report
                    .signal
                    .as_ref()
                    .map_or(Trend::Unknown, |s| s.direction);
                let line = Line::from(vec![
                    Span::raw(format!("{:<10}", report.ticker)),
                    Span::styled(direction.to_string(), theme.direction(direction)),
                ]);
                if i == app.selected() {
                    ListItem::new(line).style(theme.selected())
                } else {
                    ListItem::new(line)
                }
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Tickers")
            .border_style(theme.border()),
    );
    frame.render_widget(list, area);
}

fn render_settings(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let llm = if app.llm_enabled() {
        Span::styled("reachable", theme.success())
    } else {
        Span::styled("not reachable", theme.error())
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Symbols: ", theme.muted()),
            Span::raw(app.symbols_label().unwrap_or("none")),
        ]),
        Line::from(vec![
            Span::styled("Chart:   ", theme.muted()),
            Span::raw(app.image().map_or("none", |i| i.label.as_str())),
        ]),
        Line::from(vec![
            Span::styled("Range:   ", theme.muted()),
            Span::raw(format!("{} / {}", app.period(), app.interval())),
        ]),
        Line::from(vec![Span::styled("LLM:     ", theme.muted()), llm]),
    ];

    let block = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Settings")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let hint = if app.symbols().is_empty() {
        "Please provide a CSV file with stock symbols: finsight tui symbols.csv [chart.png]"
    } else {
        "Press [a] to analyze the portfolio."
    };

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(hint, theme.muted())),
    ];
    let block = Paragraph::new(text).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Stock Insights")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_report(frame: &mut Frame, area: Rect, report: &TickerReport, llm_enabled: bool, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Close chart
            Constraint::Length(4), // Verdict
            Constraint::Length(8), // AI explanation
        ])
        .split(area);

    match report.history.as_ref().filter(|h| !h.is_empty()) {
        Some(series) => render_close_chart(frame, chunks[0], series, theme),
        None => {
            let block = Paragraph::new(Span::styled(report.insight.as_str(), theme.warning()))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(report.ticker.as_str())
                        .border_style(theme.border()),
                );
            frame.render_widget(block, chunks[0]);
            return;
        }
    }

    render_verdict(frame, chunks[1], report, theme);
    render_explanation(frame, chunks[2], report, llm_enabled, theme);
}

/// Close prices against their index, labeled with the first and last dates.
fn render_close_chart(frame: &mut Frame, area: Rect, series: &PriceSeries, theme: &Theme) {
    let data: Vec<(f64, f64)> = series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.close))
        .collect();

    let (min, max) = data
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), (_, c)| (lo.min(*c), hi.max(*c)));
    let pad = ((max - min) * 0.05).max(0.01);
    let (lo, hi) = (min - pad, max + pad);

    let first = series.points.first().map(|p| p.time.format("%Y-%m-%d").to_string());
    let last = series.points.last().map(|p| p.time.format("%Y-%m-%d").to_string());

    let dataset = Dataset::default()
        .name("Close")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme.title())
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} close ({} {})", series.symbol, series.period, series.interval))
                .border_style(theme.border()),
        )
        .x_axis(
            Axis::default()
                .style(theme.muted())
                .bounds([0.0, (data.len().saturating_sub(1)).max(1) as f64])
                .labels(vec![
                    Span::raw(first.unwrap_or_default()),
                    Span::raw(last.unwrap_or_default()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(theme.muted())
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(format!("{:.2}", lo)),
                    Span::raw(format!("{:.2}", (lo + hi) / 2.0)),
                    Span::raw(format!("{:.2}", hi)),
                ]),
        );

    frame.render_widget(chart, area);
}

fn render_verdict(frame: &mut Frame, area: Rect, report: &TickerReport, theme: &Theme) {
    let signal = report.signal.clone().unwrap_or_default();

    let text = vec![
        Line::from(vec![
            Span::raw("Rule verdict: "),
            Span::styled(signal.direction.to_string(), theme.direction(signal.direction)),
            Span::raw(format!(
                " — ShortMA: {} , LongMA: {}",
                fmt_opt(signal.short_ma),
                fmt_opt(signal.long_ma)
            )),
        ]),
        Line::from(Span::styled(
            format!("Naive expected change: {}%", fmt_opt(signal.expected_pct_change)),
            theme.muted(),
        )),
    ];

    let block = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Signal")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_explanation(
    frame: &mut Frame,
    area: Rect,
    report: &TickerReport,
    llm_enabled: bool,
    theme: &Theme,
) {
    let (title, body) = if llm_enabled {
        (
            format!("AI explanation ({:?})", report.insight_source),
            Span::raw(report.insight.as_str()),
        )
    } else {
        (
            "AI explanation".to_string(),
            Span::styled(
                "Ollama server not reachable, AI explanation disabled.",
                theme.warning(),
            ),
        )
    };

    let block = Paragraph::new(Line::from(body))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(theme.border()),
        );
    frame.render_widget(block, area);
}
