//! Analysis modules.
//!
//! Per-dataset statistics live in `statistics`; cross-dataset
//! aggregation lives in `aggregator`.

pub mod aggregator;
pub mod statistics;

pub use aggregator::{aggregate, group_for_histogram};
pub use statistics::compute_stats;

use crate::error::AnalysisError;
use crate::models::FileStatistics;

/// Parse a raw byte stream and compute its statistics in one step.
///
/// Convenience entry point for driving interfaces that do not need the
/// intermediate cleaned series.
pub fn analyze_file(
    name: &str,
    bytes: &[u8],
    tolerance: f64,
) -> Result<FileStatistics, AnalysisError> {
    let series = crate::parser::parse(name, bytes)?;
    compute_stats(&series, tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_file_end_to_end() {
        let stats = analyze_file("scan.txt", b"0.001\n-0.002\nabc\n0.01\n", 0.003).unwrap();

        assert_eq!(stats.total_points, 4);
        assert_eq!(stats.nan_removed, 1);
        assert_eq!(stats.useful_points, 3);
        assert_eq!(stats.selected_count, 2);
    }

    #[test]
    fn test_analyze_file_propagates_decode_error() {
        let err = analyze_file("bad.bin", &[0xff, 0xfe], 0.003).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode { .. }));
    }
}
