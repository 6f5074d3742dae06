//! Error taxonomy for the analysis pipeline.
//!
//! Per-dataset failures (`Decode`) are isolated by the caller and never
//! abort the run; configuration failures are fatal before any processing
//! begins. Empty datasets are not errors at all: statistics fields come
//! back as NaN and the dataset stays in the report.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("dataset '{name}' is not valid UTF-8 text")]
    Decode { name: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("report generation failed: {0}")]
    Report(String),

    #[error("archive packaging failed: {0}")]
    Archive(String),
}

impl AnalysisError {
    /// Whether this failure aborts the whole run or only the dataset
    /// that produced it.
    #[allow(dead_code)] // Classification for driving interfaces
    pub fn is_fatal(&self) -> bool {
        match self {
            AnalysisError::Decode { .. } | AnalysisError::Render(_) => false,
            AnalysisError::Config(_) | AnalysisError::Report(_) | AnalysisError::Archive(_) => {
                true
            }
        }
    }
}
