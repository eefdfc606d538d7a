//! Chart image analysis: pixel color statistics plus a trend guess from a
//! pretrained image classifier.
//!
//! The classifier is an off-the-shelf ImageNet-style model exported to ONNX.
//! Its class index is mapped to a trend by parity (see
//! [`TrendLabel::from_class_index`]), which is a placeholder heuristic and not
//! a trained chart reader.

use crate::config::VisionConfig;
use crate::types::{ImageReport, ImageSummary, Rgb, TrendLabel};
use image::imageops::FilterType;
use image::RgbImage;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;
use tracing::{debug, error, info, warn};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Upper bound on pixels inspected for color statistics.
pub const MAX_SAMPLE_PIXELS: usize = 20_000;

/// Channel quantization step for color statistics.
pub const COLOR_BUCKET: u8 = 32;

/// Color mode of the analyzed pixels.
pub const RGB_MODE: &str = "RGB";

/// Number of most frequent colors reported.
const TOP_COLORS: usize = 3;

/// An image classifier that returns the index of its top class.
pub trait TrendModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict_class(&self, image: &RgbImage) -> anyhow::Result<usize>;
}

/// ONNX classifier run through tract.
pub struct OnnxTrendModel {
    plan: RunnableModel,
    input_size: u32,
}

impl OnnxTrendModel {
    /// Load and optimize a model with a fixed `[1, 3, size, size]` input.
    pub fn load(path: &Path, input_size: u32) -> anyhow::Result<Self> {
        let size = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())?
            .into_optimized()?
            .into_runnable()?;
        Ok(Self { plan, input_size })
    }

    /// Resize and normalize to the ViT convention (mean 0.5, std 0.5), CHW.
    fn to_tensor(&self, image: &RgbImage) -> Tensor {
        let size = self.input_size;
        let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
        tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, c, y, x)| {
                let value = resized.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0;
                (value - 0.5) / 0.5
            },
        )
        .into_tensor()
    }
}

impl TrendModel for OnnxTrendModel {
    fn name(&self) -> &str {
        "onnx"
    }

    fn predict_class(&self, image: &RgbImage) -> anyhow::Result<usize> {
        let input = self.to_tensor(image);
        let result = self.plan.run(tvec!(input.into()))?;
        let logits = result[0].to_array_view::<f32>()?;

        logits
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
            .ok_or_else(|| anyhow::anyhow!("model produced no logits"))
    }
}

/// Load the configured classifier once. A missing or broken model file
/// leaves the analyzer running without trend labels.
pub fn load_trend_model(config: &VisionConfig) -> Option<Arc<dyn TrendModel>> {
    let path = config.model_path.as_path();
    if !path.exists() {
        warn!(
            "Chart classifier not found at {:?}. Images will be analyzed without a trend label.",
            path
        );
        return None;
    }

    info!("Loading chart classifier from {:?}", path);
    match OnnxTrendModel::load(path, config.input_size) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            error!("Failed to load chart classifier: {}", e);
            None
        }
    }
}

fn quantize(channel: u8) -> u8 {
    (channel / COLOR_BUCKET) * COLOR_BUCKET
}

/// Pick at most [`MAX_SAMPLE_PIXELS`] pixels, row-major, at a fixed stride.
pub fn sample_pixels(image: &RgbImage) -> Vec<Rgb> {
    let total = image.width() as usize * image.height() as usize;
    let stride = if total > MAX_SAMPLE_PIXELS {
        total.div_ceil(MAX_SAMPLE_PIXELS)
    } else {
        1
    };

    image
        .pixels()
        .step_by(stride)
        .map(|p| (p.0[0], p.0[1], p.0[2]))
        .collect()
}

/// Most frequent quantized colors, most frequent first.
///
/// Ties are broken by color value so the result does not depend on the order
/// pixels were sampled in. An empty sample gives black with no top colors.
pub fn color_stats<I>(samples: I) -> (Rgb, Vec<Rgb>)
where
    I: IntoIterator<Item = Rgb>,
{
    let mut counts: HashMap<Rgb, usize> = HashMap::new();
    for (r, g, b) in samples {
        *counts
            .entry((quantize(r), quantize(g), quantize(b)))
            .or_insert(0) += 1;
    }

    let mut ranked: Vec<(Rgb, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let top: Vec<Rgb> = ranked.iter().take(TOP_COLORS).map(|(c, _)| *c).collect();
    let dominant = top.first().copied().unwrap_or((0, 0, 0));
    (dominant, top)
}

/// Analyzes uploaded chart images. Cheap to clone.
#[derive(Clone)]
pub struct ChartAnalyzer {
    model: Option<Arc<dyn TrendModel>>,
}

impl ChartAnalyzer {
    pub fn new(model: Option<Arc<dyn TrendModel>>) -> Self {
        Self { model }
    }

    pub fn without_model() -> Self {
        Self { model: None }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Decode and analyze raw bytes. Undecodable input yields an error report.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> ImageReport {
        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                debug!("Rejected upload of {} bytes: {}", bytes.len(), e);
                return ImageReport::error(format!("unable to open image: {}", e));
            }
        };

        // Everything below works on the 8-bit RGB conversion
        let rgb = decoded.to_rgb8();
        let (dominant_color, top_colors) = color_stats(sample_pixels(&rgb));

        let (trend_label, note) = match &self.model {
            Some(model) => match model.predict_class(&rgb) {
                Ok(index) => {
                    debug!("{} classifier picked class {}", model.name(), index);
                    (
                        Some(TrendLabel::from_class_index(index)),
                        "ViT trend prediction included".to_string(),
                    )
                }
                Err(e) => {
                    warn!("Chart classification failed: {}", e);
                    (None, format!("ViT trend prediction failed: {}", e))
                }
            },
            None => (None, "ViT trend classifier not loaded".to_string()),
        };

        ImageReport::Summary(ImageSummary {
            width: rgb.width(),
            height: rgb.height(),
            mode: RGB_MODE.to_string(),
            dominant_color,
            top_colors,
            trend_label,
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0), 0);
        assert_eq!(quantize(31), 0);
        assert_eq!(quantize(32), 32);
        assert_eq!(quantize(255), 224);
    }

    #[test]
    fn test_sample_small_image_uses_every_pixel() {
        let img = RgbImage::new(100, 100);
        assert_eq!(sample_pixels(&img).len(), 10_000);
    }

    #[test]
    fn test_sample_large_image_is_bounded() {
        let img = RgbImage::new(300, 100);
        let sampled = sample_pixels(&img);
        assert!(sampled.len() <= MAX_SAMPLE_PIXELS);
        assert_eq!(sampled.len(), 15_000);
    }

    #[test]
    fn test_color_stats_mode_and_top() {
        let samples = vec![
            (250, 10, 10),
            (240, 5, 20),
            (10, 200, 10),
            (0, 0, 0),
            (255, 0, 0),
        ];
        let (dominant, top) = color_stats(samples);

        assert_eq!(dominant, (224, 0, 0));
        assert_eq!(top, vec![(224, 0, 0), (0, 0, 0), (0, 192, 0)]);
    }

    #[test]
    fn test_color_stats_empty() {
        let (dominant, top) = color_stats(Vec::new());
        assert_eq!(dominant, (0, 0, 0));
        assert!(top.is_empty());
    }

    #[test]
    fn test_color_stats_tie_independent_of_order() {
        let forward = vec![(200, 200, 200), (10, 10, 10)];
        let backward = vec![(10, 10, 10), (200, 200, 200)];

        assert_eq!(color_stats(forward), color_stats(backward));
    }

    #[test]
    fn test_analyzer_rejects_garbage() {
        let report = ChartAnalyzer::without_model().analyze_bytes(b"definitely not a png");
        match report {
            ImageReport::Error { error } => assert!(error.starts_with("unable to open image")),
            ImageReport::Summary(_) => panic!("expected error report"),
        }
    }

    #[test]
    fn test_missing_model_file() {
        let config = VisionConfig {
            model_path: "/nonexistent/finsight/model.onnx".into(),
            input_size: 224,
        };
        assert!(load_trend_model(&config).is_none());
    }
}
