//! Theme and color definitions for the TUI.

use crate::types::{Direction, TrendLabel};
use ratatui::style::{Color, Modifier, Style};

/// Theme for the TUI with consistent color scheme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Magenta,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    /// Get style for titles.
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for headers.
    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.danger)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Get style for selected items.
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn tab_active(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Color a rule verdict.
    pub fn direction(&self, direction: Direction) -> Style {
        match direction {
            Direction::Bullish => self.success(),
            Direction::Bearish => self.error(),
            Direction::Neutral => self.warning(),
            Direction::Unknown => self.muted(),
        }
    }

    /// Color a classifier label.
    pub fn trend(&self, label: Option<TrendLabel>) -> Style {
        match label {
            Some(TrendLabel::Uptrend) => self.success(),
            Some(TrendLabel::Downtrend) => self.error(),
            None => self.muted(),
        }
    }
}
