//! Chart rendering seam.
//!
//! Chart generation is not part of the core pipeline: the report builder
//! only needs something that turns a data series into an image byte
//! blob. `ChartRenderer` is that seam. The shipped `PlaceholderRenderer`
//! emits deterministic solid-color PNGs so reports and archives are
//! complete without a plotting backend; a real backend implements the
//! same trait.

use crate::error::AnalysisError;
use crate::models::{CleanSeries, ComparisonTable, RadarVector, ToleranceWindow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Scatter marker shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    #[default]
    Circle,
    Square,
    Triangle,
    Star,
    Cross,
}

/// Chart styling options handed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Scatter marker size in points.
    pub marker_size: u32,
    pub marker_shape: MarkerShape,
    /// Histogram fill color as `#RRGGBB`.
    pub hist_color: String,
    /// Chart text size in points.
    pub font_size: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            marker_size: 4,
            marker_shape: MarkerShape::Circle,
            hist_color: "#87ceeb".to_string(),
            font_size: 10,
        }
    }
}

/// Parse a `#RRGGBB` color string.
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Turns data series into chart image bytes (PNG).
///
/// Implementations own all presentation decisions, including histogram
/// binning. A failure is an `AnalysisError::Render`; the report builder
/// skips the image and keeps the section.
pub trait ChartRenderer {
    /// Histogram of the cleaned values with tolerance markers.
    fn histogram(
        &self,
        series: &CleanSeries,
        window: &ToleranceWindow,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError>;

    /// Scatter plot of the values sorted ascending, index on the x axis.
    fn sorted_scatter(
        &self,
        series: &CleanSeries,
        window: &ToleranceWindow,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError>;

    /// Bar chart of per-dataset tolerance percentages.
    fn comparison_bar(
        &self,
        table: &ComparisonTable,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError>;

    /// Overlaid histograms, one layer per dataset.
    fn overlay_histogram(
        &self,
        groups: &[(String, Vec<f64>)],
        style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError>;

    /// Radar chart of the closed tolerance-percentage polygon.
    fn radar(&self, radar: &RadarVector, style: &ChartStyle) -> Result<Vec<u8>, AnalysisError>;
}

/// Deterministic stand-in renderer: solid-color PNG frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    const WIDTH: u32 = 320;
    const HEIGHT: u32 = 240;
    const NEUTRAL: [u8; 3] = [0xe8, 0xe8, 0xe8];
}

impl ChartRenderer for PlaceholderRenderer {
    fn histogram(
        &self,
        _series: &CleanSeries,
        _window: &ToleranceWindow,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError> {
        let color = parse_hex_color(&style.hist_color).unwrap_or(Self::NEUTRAL);
        solid_png(Self::WIDTH, Self::HEIGHT, color)
    }

    fn sorted_scatter(
        &self,
        _series: &CleanSeries,
        _window: &ToleranceWindow,
        _style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError> {
        solid_png(Self::WIDTH, Self::HEIGHT, Self::NEUTRAL)
    }

    fn comparison_bar(
        &self,
        _table: &ComparisonTable,
        _style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError> {
        solid_png(Self::WIDTH, Self::HEIGHT, Self::NEUTRAL)
    }

    fn overlay_histogram(
        &self,
        _groups: &[(String, Vec<f64>)],
        _style: &ChartStyle,
    ) -> Result<Vec<u8>, AnalysisError> {
        solid_png(Self::WIDTH, Self::HEIGHT, Self::NEUTRAL)
    }

    fn radar(&self, _radar: &RadarVector, _style: &ChartStyle) -> Result<Vec<u8>, AnalysisError> {
        solid_png(Self::WIDTH, Self::HEIGHT, Self::NEUTRAL)
    }
}

/// Encode a solid-color RGB8 PNG.
fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Result<Vec<u8>, AnalysisError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| AnalysisError::Render(format!("PNG header: {}", e)))?;

        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        writer
            .write_image_data(&data)
            .map_err(|e| AnalysisError::Render(format!("PNG data: {}", e)))?;
    }
    Ok(out)
}
