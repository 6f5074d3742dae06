//! Data models for the tolerance analysis pipeline.
//!
//! This module contains the core data structures threaded through the
//! pipeline: raw and cleaned datasets, the tolerance window, per-file
//! statistics, and the cross-dataset aggregates. Every stage returns a
//! new value; nothing here is mutated across datasets.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dataset exactly as uploaded: decoded text split into lines.
///
/// Created once per input source and never modified afterwards.
#[derive(Debug, Clone)]
pub struct RawDataset {
    /// Dataset name (the uploaded file name).
    pub name: String,
    /// Text lines in input order, one candidate value per line.
    pub lines: Vec<String>,
}

/// Numeric values surviving NaN removal, input order preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanSeries {
    /// Dataset name.
    pub name: String,
    /// Values that parsed as numbers (never NaN).
    pub values: Vec<f64>,
    /// Number of lines read, including dropped ones.
    pub total_count: usize,
    /// Lines that were empty or non-numeric.
    pub nan_removed: usize,
}

impl CleanSeries {
    /// Number of values that survived cleaning.
    pub fn useful_points(&self) -> usize {
        self.values.len()
    }

    /// True when no usable values remain.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Symmetric interval `[-t, t]` used to select in-tolerance values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceWindow {
    pub lower: f64,
    pub upper: f64,
}

impl ToleranceWindow {
    /// Build the window `[-tolerance, tolerance]`.
    ///
    /// Rejects non-positive or non-finite tolerances before any
    /// processing happens.
    pub fn symmetric(tolerance: f64) -> Result<Self, AnalysisError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "tolerance must be a positive number, got {}",
                tolerance
            )));
        }
        Ok(Self {
            lower: -tolerance,
            upper: tolerance,
        })
    }

    /// Inclusive containment on both ends.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

impl fmt::Display for ToleranceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// Full statistics record for one dataset.
///
/// `min`/`max`/`mean`/`std_dev` are computed over the tolerance-filtered
/// subset only; `q1`/`median`/`q3` (and the fences derived from them) are
/// computed over the full cleaned series. Fields that are undefined for
/// the dataset (empty selection, single-point std-dev) are NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStatistics {
    pub name: String,
    /// Lines read from the source, including dropped ones.
    pub total_points: usize,
    /// Lines dropped as empty or non-numeric.
    pub nan_removed: usize,
    /// Values remaining after cleaning.
    pub useful_points: usize,
    /// Values inside the tolerance window.
    pub selected_count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Interquartile range `q3 - q1` over the full cleaned series.
    pub iqr: f64,
    /// Cleaned values below the lower Tukey fence `q1 - 1.5*iqr`.
    pub outliers_low: usize,
    /// Cleaned values above the upper Tukey fence `q3 + 1.5*iqr`.
    pub outliers_high: usize,
    /// `selected_count / useful_points * 100`; NaN when no usable values.
    pub percent_in_tolerance: f64,
}

impl FileStatistics {
    /// False when the dataset had zero usable values and every derived
    /// field is NaN.
    pub fn has_data(&self) -> bool {
        self.useful_points > 0
    }
}

/// One row of the cross-dataset comparison table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub name: String,
    pub mean: f64,
    pub std_dev: f64,
    pub percent_in_tolerance: f64,
}

/// Cross-dataset summary table, one row per dataset in upload order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    #[allow(dead_code)] // Utility for driving interfaces
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Closed-polygon representation of per-dataset tolerance percentages.
///
/// `values` and `angles` carry one extra trailing element equal to their
/// first so the polygon closes; `labels` does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarVector {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Angles in radians, evenly spaced over 2π.
    pub angles: Vec<f64>,
}

impl RadarVector {
    /// Invariant check: one trailing closing element on values and
    /// angles, none on labels. Bit comparison so a NaN percentage
    /// (empty dataset) still closes.
    pub fn is_closed(&self) -> bool {
        let bits = |v: Option<&f64>| v.map(|v| v.to_bits());
        self.values.len() == self.labels.len() + 1
            && self.angles.len() == self.labels.len() + 1
            && bits(self.values.first()) == bits(self.values.last())
            && bits(self.angles.first()) == bits(self.angles.last())
    }
}

/// Result of running one dataset through the parse and statistics stages.
///
/// A decode failure aborts that dataset only; the name is kept so the
/// report can list it as a failed entry.
#[derive(Debug, Clone)]
pub enum DatasetOutcome {
    /// Parsed and analyzed; the series is kept for chart rendering.
    Analyzed {
        series: CleanSeries,
        stats: FileStatistics,
    },
    /// The dataset could not be decoded as text.
    Failed { name: String, reason: String },
}

impl DatasetOutcome {
    pub fn name(&self) -> &str {
        match self {
            DatasetOutcome::Analyzed { stats, .. } => &stats.name,
            DatasetOutcome::Failed { name, .. } => name,
        }
    }

    pub fn stats(&self) -> Option<&FileStatistics> {
        match self {
            DatasetOutcome::Analyzed { stats, .. } => Some(stats),
            DatasetOutcome::Failed { .. } => None,
        }
    }
}

/// The packaged report: manifest text plus the final archive bytes.
#[derive(Debug, Clone)]
pub struct Archive {
    /// Archive file name, `Analisi_<YYYYMMDD>.zip`.
    pub file_name: String,
    /// Name of the document entry inside the archive.
    pub document_name: String,
    /// The fixed-template README.txt contents.
    pub manifest: String,
    /// The complete ZIP byte stream.
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_window_symmetric() {
        let window = ToleranceWindow::symmetric(0.003).unwrap();
        assert_eq!(window.lower, -0.003);
        assert_eq!(window.upper, 0.003);
        assert!(window.contains(0.003));
        assert!(window.contains(-0.003));
        assert!(window.contains(0.0));
        assert!(!window.contains(0.0031));
    }

    #[test]
    fn test_tolerance_window_rejects_non_positive() {
        assert!(ToleranceWindow::symmetric(0.0).is_err());
        assert!(ToleranceWindow::symmetric(-0.5).is_err());
        assert!(ToleranceWindow::symmetric(f64::NAN).is_err());
    }

    #[test]
    fn test_clean_series_accounting() {
        let series = CleanSeries {
            name: "a.txt".to_string(),
            values: vec![0.1, 0.2],
            total_count: 3,
            nan_removed: 1,
        };
        assert_eq!(series.useful_points(), 2);
        assert_eq!(
            series.nan_removed,
            series.total_count - series.useful_points()
        );
        assert!(!series.is_empty());
    }

    #[test]
    fn test_radar_vector_closure() {
        let radar = RadarVector {
            labels: vec!["a".to_string(), "b".to_string()],
            values: vec![80.0, 60.0, 80.0],
            angles: vec![0.0, std::f64::consts::PI, 0.0],
        };
        assert!(radar.is_closed());

        let open = RadarVector {
            labels: vec!["a".to_string(), "b".to_string()],
            values: vec![80.0, 60.0],
            angles: vec![0.0, std::f64::consts::PI],
        };
        assert!(!open.is_closed());
    }

    #[test]
    fn test_outcome_name() {
        let failed = DatasetOutcome::Failed {
            name: "bad.txt".to_string(),
            reason: "not UTF-8".to_string(),
        };
        assert_eq!(failed.name(), "bad.txt");
        assert!(failed.stats().is_none());
    }
}
