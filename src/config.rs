//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.meshtol.toml` files. Validation runs before any dataset is touched:
//! a bad tolerance or chart option is fatal for the whole run.

use crate::error::AnalysisError;
use crate::render::{parse_hex_color, ChartStyle, MarkerShape};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Chart styling settings.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the archive (and optional stats dump) is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Symmetric tolerance; values in `[-tolerance, tolerance]` count as
    /// in tolerance. Must be positive.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Emit the radar section when more than one dataset is analyzed.
    #[serde(default)]
    pub radar_enabled: bool,

    /// Emit the global comparison section.
    #[serde(default)]
    pub compare_enabled: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            radar_enabled: false,
            compare_enabled: false,
        }
    }
}

fn default_tolerance() -> f64 {
    0.003
}

/// Chart styling settings, forwarded to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Scatter marker size in points (2..=20).
    #[serde(default = "default_marker_size")]
    pub marker_size: u32,

    /// Scatter marker shape.
    #[serde(default)]
    pub marker_shape: MarkerShape,

    /// Histogram fill color as `#RRGGBB`.
    #[serde(default = "default_hist_color")]
    pub hist_color: String,

    /// Chart text size in points (8..=20).
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            marker_size: default_marker_size(),
            marker_shape: MarkerShape::default(),
            hist_color: default_hist_color(),
            font_size: default_font_size(),
        }
    }
}

fn default_marker_size() -> u32 {
    4
}

fn default_hist_color() -> String {
    "#87ceeb".to_string()
}

fn default_font_size() -> u32 {
    10
}

impl From<&ChartConfig> for ChartStyle {
    fn from(config: &ChartConfig) -> Self {
        Self {
            marker_size: config.marker_size,
            marker_shape: config.marker_shape,
            hist_color: config.hist_color.clone(),
            font_size: config.font_size,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".meshtol.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(tolerance) = args.tolerance {
            self.analysis.tolerance = tolerance;
        }

        // Toggles only switch features on; the config file can keep them
        // enabled without CLI flags.
        if args.radar {
            self.analysis.radar_enabled = true;
        }
        if args.compare {
            self.analysis.compare_enabled = true;
        }

        if let Some(marker_size) = args.marker_size {
            self.chart.marker_size = marker_size;
        }
        if let Some(marker_shape) = args.marker_shape {
            self.chart.marker_shape = marker_shape;
        }
        if let Some(ref hist_color) = args.hist_color {
            self.chart.hist_color = hist_color.clone();
        }
        if let Some(font_size) = args.font_size {
            self.chart.font_size = font_size;
        }

        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Reject invalid settings before any dataset is processed.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.analysis.tolerance.is_finite() || self.analysis.tolerance <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "tolerance must be a positive number, got {}",
                self.analysis.tolerance
            )));
        }

        if !(2..=20).contains(&self.chart.marker_size) {
            return Err(AnalysisError::Config(format!(
                "marker size must be between 2 and 20, got {}",
                self.chart.marker_size
            )));
        }

        if !(8..=20).contains(&self.chart.font_size) {
            return Err(AnalysisError::Config(format!(
                "font size must be between 8 and 20, got {}",
                self.chart.font_size
            )));
        }

        if parse_hex_color(&self.chart.hist_color).is_none() {
            return Err(AnalysisError::Config(format!(
                "histogram color must be '#RRGGBB', got '{}'",
                self.chart.hist_color
            )));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
