use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB triple after bucket quantization.
pub type Rgb = (u8, u8, u8);

/// Binary trend guess from the chart classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendLabel {
    Uptrend,
    Downtrend,
}

impl TrendLabel {
    /// Map a predicted class index to a label: even is up, odd is down.
    ///
    /// The classifier was never trained on charts, so this is a placeholder
    /// and carries no market meaning.
    pub fn from_class_index(index: usize) -> Self {
        if index % 2 == 0 {
            TrendLabel::Uptrend
        } else {
            TrendLabel::Downtrend
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendLabel::Uptrend => write!(f, "Uptrend"),
            TrendLabel::Downtrend => write!(f, "Downtrend"),
        }
    }
}

/// Pixel statistics and trend guess for an uploaded chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
    /// Color mode the statistics were computed in; always `RGB`.
    pub mode: String,
    pub dominant_color: Rgb,
    pub top_colors: Vec<Rgb>,
    pub trend_label: Option<TrendLabel>,
    pub note: String,
}

/// Outcome of analyzing uploaded bytes. Serializes either as the summary
/// fields or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageReport {
    Summary(ImageSummary),
    Error { error: String },
}

impl ImageReport {
    pub fn error(message: impl Into<String>) -> Self {
        ImageReport::Error {
            error: message.into(),
        }
    }

    pub fn summary(&self) -> Option<&ImageSummary> {
        match self {
            ImageReport::Summary(s) => Some(s),
            ImageReport::Error { .. } => None,
        }
    }

    pub fn trend(&self) -> Option<TrendLabel> {
        self.summary().and_then(|s| s.trend_label)
    }

    /// Plain-text description, suitable for a prompt.
    pub fn describe(&self) -> String {
        match self {
            ImageReport::Error { error } => format!("Image analysis error: {}", error),
            ImageReport::Summary(s) => {
                let trend = s
                    .trend_label
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                let (r, g, b) = s.dominant_color;
                format!(
                    "Image {}x{}, Dominant color: ({}, {}, {}). ViT trend prediction: {}. {}",
                    s.width, s.height, r, g, b, trend, s.note
                )
            }
        }
    }
}
