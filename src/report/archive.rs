//! Report packaging.
//!
//! The final artifact is a ZIP archive named from the analysis date,
//! holding the fixed-template `README.txt` manifest and the PDF
//! document. Packaging is deterministic: entry timestamps are pinned so
//! identical inputs produce byte-identical archives.

use crate::error::AnalysisError;
use crate::models::Archive;
use chrono::NaiveDate;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Package the report document into the dated archive.
pub fn package(document: &[u8], date: NaiveDate) -> Result<Archive, AnalysisError> {
    let stamp = date.format("%Y%m%d").to_string();
    let document_name = format!("Analisi_{}.pdf", stamp);
    let file_name = format!("Analisi_{}.zip", stamp);
    let manifest = manifest_text(&document_name);

    // Pinned timestamp keeps the archive byte-identical across runs.
    let entry_options = || {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
    };

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    writer
        .start_file("README.txt", entry_options())
        .and_then(|_| writer.write_all(manifest.as_bytes()).map_err(Into::into))
        .map_err(|e| AnalysisError::Archive(format!("README.txt: {}", e)))?;

    writer
        .start_file(document_name.as_str(), entry_options())
        .and_then(|_| writer.write_all(document).map_err(Into::into))
        .map_err(|e| AnalysisError::Archive(format!("{}: {}", document_name, e)))?;

    let cursor = writer
        .finish()
        .map_err(|e| AnalysisError::Archive(format!("finalize: {}", e)))?;

    Ok(Archive {
        file_name,
        document_name,
        manifest,
        bytes: cursor.into_inner(),
    })
}

/// The fixed README template. Lists the document and the image naming
/// convention used by chart renderers; identical inputs must yield
/// byte-identical text.
fn manifest_text(document_name: &str) -> String {
    format!(
        "Contents of the ZIP file:\n\
         - {}: PDF report of the analysis\n\
         - radar_plot.png: radar chart (if generated)\n\
         - *_hist.png: histogram for each uploaded file\n\
         - *_scatter.png: ordered scatter plot for each uploaded file\n",
        document_name
    )
}
