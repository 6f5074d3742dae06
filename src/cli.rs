//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::render::MarkerShape;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Meshtol - tolerance analysis and PDF reporting for numeric datasets
///
/// Reads one value per line from each input file, filters against a
/// symmetric tolerance window, and packages per-file and cross-file
/// statistics into a PDF report inside a dated ZIP archive.
///
/// Examples:
///   meshtol scan_a.txt
///   meshtol scan_a.txt scan_b.txt --tolerance 0.005 --radar --compare
///   meshtol scan_a.txt --title "Fixture 12" --date 2024-03-15
///   meshtol --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset files to analyze, one value per line
    ///
    /// Upload order is preserved throughout the report.
    #[arg(value_name = "FILES", required_unless_present = "init_config")]
    pub files: Vec<PathBuf>,

    /// Report title
    #[arg(short, long, default_value = "Analisi di Sovrapposizione")]
    pub title: String,

    /// Analysis date (YYYY-MM-DD)
    ///
    /// Names the archive and the document; defaults to today.
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Symmetric tolerance; values in [-t, t] count as in tolerance
    ///
    /// Must be positive. Can also be set via MESHTOL_TOLERANCE or
    /// .meshtol.toml config. Default: 0.003.
    #[arg(long, value_name = "FLOAT", env = "MESHTOL_TOLERANCE")]
    pub tolerance: Option<f64>,

    /// Scatter marker size in points (2-20)
    #[arg(long, value_name = "SIZE")]
    pub marker_size: Option<u32>,

    /// Scatter marker shape
    #[arg(long, value_name = "SHAPE")]
    pub marker_shape: Option<MarkerShape>,

    /// Histogram fill color (#RRGGBB)
    #[arg(long, value_name = "COLOR")]
    pub hist_color: Option<String>,

    /// Chart text size in points (8-20)
    #[arg(long, value_name = "SIZE")]
    pub font_size: Option<u32>,

    /// Add the radar section when more than one file is analyzed
    #[arg(long)]
    pub radar: bool,

    /// Add the global comparison section
    #[arg(long)]
    pub compare: bool,

    /// Header image (PNG) embedded on the report cover
    #[arg(long, value_name = "FILE")]
    pub header_image: Option<PathBuf>,

    /// Directory to write the archive into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also write the per-file statistics as JSON
    #[arg(long, value_name = "FILE")]
    pub stats_json: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .meshtol.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: parse the datasets and print counts without building a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .meshtol.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.files.is_empty() {
            return Err("At least one dataset file is required".to_string());
        }

        for file in &self.files {
            if !file.exists() {
                return Err(format!("Dataset file does not exist: {}", file.display()));
            }
            if !file.is_file() {
                return Err(format!("Dataset path is not a file: {}", file.display()));
            }
        }

        if let Some(tolerance) = self.tolerance {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err("Tolerance must be a positive number".to_string());
            }
        }

        if let Some(size) = self.marker_size {
            if !(2..=20).contains(&size) {
                return Err("Marker size must be between 2 and 20".to_string());
            }
        }

        if let Some(size) = self.font_size {
            if !(8..=20).contains(&size) {
                return Err("Font size must be between 8 and 20".to_string());
            }
        }

        if let Some(ref color) = self.hist_color {
            if crate::render::parse_hex_color(color).is_none() {
                return Err(format!("Histogram color must be '#RRGGBB', got '{}'", color));
            }
        }

        if let Some(ref header) = self.header_image {
            if !header.is_file() {
                return Err(format!(
                    "Header image does not exist: {}",
                    header.display()
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The analysis date, defaulting to today.
    pub fn analysis_date(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
