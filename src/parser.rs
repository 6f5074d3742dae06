//! Dataset parsing: raw bytes to a cleaned numeric series.
//!
//! Input files carry one candidate value per line. Decoding failures
//! abort the dataset (never the run); lines that are empty or fail
//! numeric conversion are dropped and counted as `nan_removed`.

use crate::error::AnalysisError;
use crate::models::{CleanSeries, RawDataset};
use tracing::debug;

/// Decode a byte stream as UTF-8 text split into lines.
pub fn decode(name: &str, bytes: &[u8]) -> Result<RawDataset, AnalysisError> {
    let text = std::str::from_utf8(bytes).map_err(|_| AnalysisError::Decode {
        name: name.to_string(),
    })?;

    Ok(RawDataset {
        name: name.to_string(),
        lines: text.lines().map(str::to_string).collect(),
    })
}

/// Convert each line to a number, dropping the ones that fail.
///
/// A line that is empty, non-numeric, or a literal NaN is dropped and
/// counted. Input order is preserved; the series is never sorted here.
pub fn clean(raw: &RawDataset) -> CleanSeries {
    let total_count = raw.lines.len();
    let mut values = Vec::with_capacity(total_count);

    for (index, line) in raw.lines.iter().enumerate() {
        match line.trim().parse::<f64>() {
            Ok(value) if !value.is_nan() => values.push(value),
            _ => {
                debug!(
                    "{}: dropping line {} ({:?})",
                    raw.name,
                    index + 1,
                    line
                );
            }
        }
    }

    let nan_removed = total_count - values.len();
    CleanSeries {
        name: raw.name.clone(),
        values,
        total_count,
        nan_removed,
    }
}

/// Decode and clean in one step.
pub fn parse(name: &str, bytes: &[u8]) -> Result<CleanSeries, AnalysisError> {
    let raw = decode(name, bytes)?;
    Ok(clean(&raw))
}
