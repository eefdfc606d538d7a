//! Chart analysis view - image summary and combined insight.

use super::{App, Theme};
use crate::types::{ImageReport, ImageSummary, Rgb};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the chart analysis view.
pub fn render(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(insight) = app.image_insight() else {
        let hint = match app.image() {
            Some(image) => format!("{} loaded. Press [a] to analyze.", image.label),
            None => "No chart image loaded: finsight tui symbols.csv chart.png".to_string(),
        };
        let block = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(hint, theme.muted())),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Chart Analysis")
                .border_style(theme.border()),
        );
        frame.render_widget(block, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);

    let summary = match &insight.image {
        ImageReport::Summary(summary) => summary_lines(summary, theme),
        ImageReport::Error { error } => vec![Line::from(Span::styled(
            format!("Image analysis error: {}", error),
            theme.error(),
        ))],
    };
    let block = Paragraph::new(summary).block(
        Block::default()
            .borders(Borders::ALL)
            .title(app.image().map_or("Image", |i| i.label.as_str()))
            .border_style(theme.border()),
    );
    frame.render_widget(block, chunks[0]);

    let title = match &insight.ticker {
        Some(ticker) => format!("Combined insight ({})", ticker),
        None => "Image insight".to_string(),
    };
    let body = Paragraph::new(insight.insight.text.as_str())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(theme.border()),
        );
    frame.render_widget(body, chunks[1]);
}

fn swatch(color: Rgb) -> Vec<Span<'static>> {
    let (r, g, b) = color;
    vec![
        Span::styled("  ", Style::default().bg(Color::Rgb(r, g, b))),
        Span::raw(format!(" ({}, {}, {})  ", r, g, b)),
    ]
}

fn summary_lines<'a>(summary: &'a ImageSummary, theme: &Theme) -> Vec<Line<'a>> {
    let trend = summary
        .trend_label
        .map_or_else(|| "Unknown".to_string(), |t| t.to_string());

    let mut dominant = vec![Span::styled("Dominant: ", theme.muted())];
    dominant.extend(swatch(summary.dominant_color));

    let mut top = vec![Span::styled("Top:      ", theme.muted())];
    for color in &summary.top_colors {
        top.extend(swatch(*color));
    }

    vec![
        Line::from(vec![
            Span::styled("Size:     ", theme.muted()),
            Span::raw(format!("{}x{} ({})", summary.width, summary.height, summary.mode)),
        ]),
        Line::from(dominant),
        Line::from(top),
        Line::from(vec![
            Span::styled("Trend:    ", theme.muted()),
            Span::styled(trend, theme.trend(summary.trend_label)),
        ]),
        Line::from(Span::styled(summary.note.as_str(), theme.muted())),
    ]
}
