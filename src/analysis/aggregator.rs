//! Cross-dataset aggregation.
//!
//! This module combines per-dataset statistics into the comparison table
//! and the closed-polygon radar vector. Both are built append-only after
//! all per-file statistics are available; input order (= upload order) is
//! preserved everywhere.

use crate::models::{CleanSeries, ComparisonRow, ComparisonTable, FileStatistics, RadarVector};

/// Combine per-file statistics into the cross-dataset aggregates.
///
/// The radar vector is `None` for fewer than two datasets; whether it is
/// actually used is the caller's toggle, not this engine's.
pub fn aggregate(per_file: &[FileStatistics]) -> (ComparisonTable, Option<RadarVector>) {
    (build_comparison(per_file), build_radar(per_file))
}

/// Project per-file statistics into the comparison table.
///
/// One row per dataset in input order; empty-dataset rows keep their NaN
/// fields rather than being dropped.
pub fn build_comparison(per_file: &[FileStatistics]) -> ComparisonTable {
    let rows = per_file
        .iter()
        .map(|stats| ComparisonRow {
            name: stats.name.clone(),
            mean: stats.mean,
            std_dev: stats.std_dev,
            percent_in_tolerance: stats.percent_in_tolerance,
        })
        .collect();

    ComparisonTable { rows }
}

/// Build the radar polygon from per-file tolerance percentages.
///
/// Returns `None` for fewer than two datasets. Values and angles are
/// closed by appending their first element; labels stay open. Angles are
/// evenly spaced over 2π in label order.
pub fn build_radar(per_file: &[FileStatistics]) -> Option<RadarVector> {
    if per_file.len() < 2 {
        return None;
    }

    let labels: Vec<String> = per_file.iter().map(|s| s.name.clone()).collect();
    let mut values: Vec<f64> = per_file.iter().map(|s| s.percent_in_tolerance).collect();
    let n = labels.len();

    let mut angles: Vec<f64> = (0..n)
        .map(|i| i as f64 * std::f64::consts::TAU / n as f64)
        .collect();

    values.push(values[0]);
    angles.push(angles[0]);

    let radar = RadarVector {
        labels,
        values,
        angles,
    };
    debug_assert!(radar.is_closed());
    Some(radar)
}

/// Group cleaned values by dataset name for the overlay histogram.
///
/// Binning is the renderer's concern; this only hands over the raw
/// values in upload order.
pub fn group_for_histogram(per_file: &[CleanSeries]) -> Vec<(String, Vec<f64>)> {
    per_file
        .iter()
        .map(|series| (series.name.clone(), series.values.clone()))
        .collect()
}
