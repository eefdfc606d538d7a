//! Terminal UI: portfolio signals with AI commentary, and chart analysis.

mod app;
mod events;
mod chart;
mod portfolio;
mod theme;

pub use app::{run_tui, App, TuiOptions};
pub use theme::Theme;

/// Route/View enum for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Portfolio,
    Chart,
}

impl Route {
    /// Get all available routes.
    pub fn all() -> Vec<Self> {
        vec![Self::Portfolio, Self::Chart]
    }

    /// Get the route name.
    pub fn name(&self) -> &str {
        match self {
            Self::Portfolio => "Portfolio",
            Self::Chart => "Chart Analysis",
        }
    }

    /// Get the route shortcut key.
    pub fn key(&self) -> char {
        match self {
            Self::Portfolio => '1',
            Self::Chart => '2',
        }
    }
}
