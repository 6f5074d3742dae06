//! Per-dataset descriptive statistics under a tolerance window.
//!
//! Location statistics (`min`, `max`, `mean`, `std_dev`) are computed
//! over the tolerance-filtered subset only, while the quartiles and the
//! Tukey fences derived from them run over the full cleaned series.
//! The asymmetry is intentional and matches the reference behavior of
//! the analysis this tool replaces.
//!
//! Undefined quantities are NaN, never a panic: an empty selection has
//! NaN location statistics, a single-point selection has a NaN sample
//! standard deviation, and an empty series has NaN everywhere.

use crate::error::AnalysisError;
use crate::models::{CleanSeries, FileStatistics, ToleranceWindow};

/// Compute the full statistics record for one cleaned series.
pub fn compute_stats(
    series: &CleanSeries,
    tolerance: f64,
) -> Result<FileStatistics, AnalysisError> {
    let window = ToleranceWindow::symmetric(tolerance)?;

    let selected: Vec<f64> = series
        .values
        .iter()
        .copied()
        .filter(|v| window.contains(*v))
        .collect();

    let useful_points = series.useful_points();
    let selected_count = selected.len();

    let mut sorted = series.values.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = quantile_sorted(&sorted, 0.25);
    let median = quantile_sorted(&sorted, 0.50);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;
    let (outliers_low, outliers_high) = if iqr.is_nan() {
        (0, 0)
    } else {
        (
            series.values.iter().filter(|v| **v < lower_fence).count(),
            series.values.iter().filter(|v| **v > upper_fence).count(),
        )
    };

    let percent_in_tolerance = if useful_points == 0 {
        f64::NAN
    } else {
        selected_count as f64 / useful_points as f64 * 100.0
    };

    Ok(FileStatistics {
        name: series.name.clone(),
        total_points: series.total_count,
        nan_removed: series.nan_removed,
        useful_points,
        selected_count,
        min: minimum(&selected),
        max: maximum(&selected),
        mean: mean(&selected),
        std_dev: sample_std_dev(&selected),
        q1,
        median,
        q3,
        iqr,
        outliers_low,
        outliers_high,
        percent_in_tolerance,
    })
}

fn minimum(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn maximum(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with Bessel's correction (divisor n-1).
///
/// NaN for fewer than two values.
fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (n - 1) as f64).sqrt()
}

/// Quantile via linear interpolation (the R-7 method, NumPy's default).
///
/// For pre-sorted data and `p` in `[0, 1]`: `h = (n - 1) * p`, then
/// interpolate between the values at `floor(h)` and `floor(h) + 1`.
/// NaN for an empty slice.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();

    if j + 1 >= n {
        sorted[n - 1]
    } else {
        (1.0 - g) * sorted[j] + g * sorted[j + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_series(values: Vec<f64>, total_count: usize) -> CleanSeries {
        let nan_removed = total_count - values.len();
        CleanSeries {
            name: "scan.txt".to_string(),
            values,
            total_count,
            nan_removed,
        }
    }

    #[test]
    fn test_reference_scenario() {
        // Lines "0.001", "-0.002", "abc", "0.01" at tolerance 0.003.
        let series = make_series(vec![0.001, -0.002, 0.01], 4);
        let stats = compute_stats(&series, 0.003).unwrap();

        assert_eq!(stats.total_points, 4);
        assert_eq!(stats.nan_removed, 1);
        assert_eq!(stats.useful_points, 3);
        assert_eq!(stats.selected_count, 2);
        assert!((stats.percent_in_tolerance - 66.666_666_666_666_67).abs() < 1e-9);

        // Location statistics over the selected subset {0.001, -0.002}.
        assert!((stats.mean - (-0.0005)).abs() < 1e-12);
        assert_eq!(stats.min, -0.002);
        assert_eq!(stats.max, 0.001);
        assert!((stats.std_dev - 0.002_121_320_343_559_643).abs() < 1e-12);

        // Quartiles over the full cleaned series {-0.002, 0.001, 0.01}.
        assert!((stats.q1 - (-0.0005)).abs() < 1e-12);
        assert!((stats.median - 0.001).abs() < 1e-12);
        assert!((stats.q3 - 0.0055).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_is_all_nan() {
        let series = make_series(vec![], 0);
        let stats = compute_stats(&series, 0.003).unwrap();

        assert!(!stats.has_data());
        assert_eq!(stats.useful_points, 0);
        assert_eq!(stats.selected_count, 0);
        assert!(stats.min.is_nan());
        assert!(stats.max.is_nan());
        assert!(stats.mean.is_nan());
        assert!(stats.std_dev.is_nan());
        assert!(stats.q1.is_nan());
        assert!(stats.median.is_nan());
        assert!(stats.q3.is_nan());
        assert!(stats.iqr.is_nan());
        assert!(stats.percent_in_tolerance.is_nan());
        assert_eq!(stats.outliers_low, 0);
        assert_eq!(stats.outliers_high, 0);
    }

    #[test]
    fn test_nothing_selected() {
        let series = make_series(vec![1.0, 2.0, -3.0], 3);
        let stats = compute_stats(&series, 0.003).unwrap();

        assert_eq!(stats.selected_count, 0);
        assert_eq!(stats.percent_in_tolerance, 0.0);
        // Location statistics are undefined for an empty selection,
        // but the quartiles still run over the full series.
        assert!(stats.mean.is_nan());
        assert!(stats.min.is_nan());
        assert!(stats.max.is_nan());
        assert!(stats.std_dev.is_nan());
        assert!(!stats.median.is_nan());
    }

    #[test]
    fn test_everything_selected() {
        let series = make_series(vec![0.001, -0.001, 0.0], 3);
        let stats = compute_stats(&series, 0.003).unwrap();

        assert_eq!(stats.selected_count, 3);
        assert_eq!(stats.percent_in_tolerance, 100.0);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let series = make_series(vec![0.003, -0.003, 0.004], 3);
        let stats = compute_stats(&series, 0.003).unwrap();
        assert_eq!(stats.selected_count, 2);
    }

    #[test]
    fn test_single_selected_point() {
        let series = make_series(vec![0.002, 7.0], 2);
        let stats = compute_stats(&series, 0.003).unwrap();

        assert_eq!(stats.selected_count, 1);
        assert_eq!(stats.mean, 0.002);
        assert_eq!(stats.min, 0.002);
        assert_eq!(stats.max, 0.002);
        // Sample std-dev is undefined for n = 1.
        assert!(stats.std_dev.is_nan());
    }

    #[test]
    fn test_quartile_ordering() {
        let series = make_series(vec![0.5, -1.2, 3.3, 0.0, 2.1, -0.7, 1.8], 7);
        let stats = compute_stats(&series, 1.0).unwrap();

        assert!(stats.q1 <= stats.median);
        assert!(stats.median <= stats.q3);
        assert!((stats.iqr - (stats.q3 - stats.q1)).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_matches_numpy() {
        // np.percentile([1, 2, 3, 4], [25, 50, 75]) -> [1.75, 2.5, 3.25]
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile_sorted(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile_sorted(&sorted, 0.50) - 2.5).abs() < 1e-12);
        assert!((quantile_sorted(&sorted, 0.75) - 3.25).abs() < 1e-12);
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 4.0);
    }

    #[test]
    fn test_percent_bounds() {
        let datasets = [
            vec![0.001, 0.002, 0.01, -0.5],
            vec![0.0],
            vec![9.0, 8.0],
        ];
        for values in datasets {
            let n = values.len();
            let stats = compute_stats(&make_series(values, n), 0.003).unwrap();
            assert!(stats.percent_in_tolerance >= 0.0);
            assert!(stats.percent_in_tolerance <= 100.0);
        }
    }

    #[test]
    fn test_outlier_counts() {
        // Tight cluster plus one far point on each side.
        let mut values = vec![0.0, 0.01, -0.01, 0.02, -0.02, 0.005, -0.005];
        values.push(10.0);
        values.push(-10.0);
        let n = values.len();
        let stats = compute_stats(&make_series(values, n), 0.05).unwrap();

        assert_eq!(stats.outliers_high, 1);
        assert_eq!(stats.outliers_low, 1);
    }

    #[test]
    fn test_no_outliers_inside_fences() {
        let series = make_series(vec![1.0, 2.0, 3.0, 4.0, 5.0], 5);
        let stats = compute_stats(&series, 10.0).unwrap();
        assert_eq!(stats.outliers_low, 0);
        assert_eq!(stats.outliers_high, 0);
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        let series = make_series(vec![1.0], 1);
        assert!(compute_stats(&series, 0.0).is_err());
        assert!(compute_stats(&series, -1.0).is_err());
    }
}
