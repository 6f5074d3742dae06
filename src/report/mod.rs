//! Report generation and packaging.
//!
//! `generator` assembles the ordered sections into the PDF document,
//! `pdf` owns the low-level page layout, and `archive` packages the
//! document with its manifest into the dated ZIP.

pub mod archive;
pub mod generator;
pub mod pdf;

pub use archive::package;
pub use generator::{build_report, ComparisonImages, PerFileImages, ReportInputs};
