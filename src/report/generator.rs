//! Report assembly.
//!
//! This module renders the analysis results into the PDF document.
//! Section order is fixed: cover with dataset index, one section per
//! dataset in upload order, the global comparison, then the radar chart.
//! Images come pre-rendered from the chart renderer; a missing image
//! never suppresses its section.

use crate::error::AnalysisError;
use crate::models::{ComparisonTable, DatasetOutcome, FileStatistics, RadarVector};
use crate::report::pdf::PdfWriter;
use chrono::NaiveDate;
use tracing::warn;

const HEADING_SIZE: f64 = 16.0;
const SUBHEADING_SIZE: f64 = 14.0;
const BODY_SIZE: f64 = 12.0;
const STATS_SIZE: f64 = 10.0;

/// Chart images for one dataset section. `None` marks a render failure;
/// the section is emitted without that image.
#[derive(Debug, Clone, Default)]
pub struct PerFileImages {
    pub histogram: Option<Vec<u8>>,
    pub scatter: Option<Vec<u8>>,
}

/// Images for the global comparison section.
#[derive(Debug, Clone, Default)]
pub struct ComparisonImages {
    pub bar: Option<Vec<u8>>,
    pub overlay: Option<Vec<u8>>,
}

/// Everything the report builder needs for one document.
pub struct ReportInputs<'a> {
    pub title: &'a str,
    pub date: NaiveDate,
    /// Optional cover image (PNG bytes).
    pub header_image: Option<&'a [u8]>,
    /// Per-dataset outcomes in upload order.
    pub outcomes: &'a [DatasetOutcome],
    /// One entry per outcome, same order.
    pub per_file_images: &'a [PerFileImages],
    /// Present only when comparison was requested.
    pub comparison: Option<&'a ComparisonTable>,
    pub comparison_images: ComparisonImages,
    /// Present only when the radar vector exists.
    pub radar: Option<&'a RadarVector>,
    pub radar_image: Option<Vec<u8>>,
}

/// Render the complete report document.
pub fn build_report(inputs: &ReportInputs) -> Result<Vec<u8>, AnalysisError> {
    let mut writer = PdfWriter::new();

    write_cover(&mut writer, inputs)?;
    writer.new_page()?;

    for (index, outcome) in inputs.outcomes.iter().enumerate() {
        let images = inputs.per_file_images.get(index);
        write_file_section(&mut writer, outcome, images)?;
    }

    if let Some(table) = inputs.comparison {
        write_comparison_section(&mut writer, table, &inputs.comparison_images)?;
    }

    if inputs.radar.is_some() {
        write_radar_section(&mut writer, inputs.radar_image.as_deref())?;
    }

    writer.finish()
}

/// Cover: heading, title, display date, optional header image, and the
/// index of every dataset in upload order.
fn write_cover(writer: &mut PdfWriter, inputs: &ReportInputs) -> Result<(), AnalysisError> {
    writer.text_line("Mesh Overlap Analysis", HEADING_SIZE, true)?;
    writer.gap(6.0)?;
    writer.text_line(&format!("Title: {}", inputs.title), BODY_SIZE, false)?;
    writer.text_line(
        &format!("Date: {}", inputs.date.format("%d/%m/%Y")),
        BODY_SIZE,
        false,
    )?;
    writer.gap(14.0)?;

    if let Some(png) = inputs.header_image {
        // A bad header image only costs the image, never the report.
        match writer.image(png, 180.0) {
            Ok(()) => writer.gap(14.0)?,
            Err(e) => warn!("Skipping header image: {}", e),
        }
    }

    writer.text_line("Analyzed Datasets", SUBHEADING_SIZE, true)?;
    for outcome in inputs.outcomes {
        writer.text_line(&format!("- {}", outcome.name()), BODY_SIZE, false)?;
    }
    Ok(())
}

/// One dataset section: the statistics block as label:value lines,
/// followed by the histogram and ordered-scatter images.
fn write_file_section(
    writer: &mut PdfWriter,
    outcome: &DatasetOutcome,
    images: Option<&PerFileImages>,
) -> Result<(), AnalysisError> {
    writer.text_line(&format!("File: {}", outcome.name()), BODY_SIZE, true)?;

    match outcome {
        DatasetOutcome::Failed { reason, .. } => {
            writer.text_line(&format!("Analysis failed: {}", reason), STATS_SIZE, false)?;
        }
        DatasetOutcome::Analyzed { stats, .. } => {
            write_stats_block(writer, stats)?;

            if let Some(images) = images {
                if let Some(png) = &images.histogram {
                    writer.gap(6.0)?;
                    writer.image(png, PdfWriter::content_width())?;
                }
                if let Some(png) = &images.scatter {
                    writer.gap(6.0)?;
                    writer.image(png, PdfWriter::content_width())?;
                }
            }
        }
    }

    writer.gap(16.0)?;
    Ok(())
}

fn write_stats_block(writer: &mut PdfWriter, stats: &FileStatistics) -> Result<(), AnalysisError> {
    if !stats.has_data() {
        writer.text_line("No usable data points", STATS_SIZE, false)?;
    }

    let lines = [
        ("Total points", stats.total_points.to_string()),
        ("NaN removed", stats.nan_removed.to_string()),
        ("Useful points", stats.useful_points.to_string()),
        ("In tolerance", stats.selected_count.to_string()),
        ("Minimum", fmt_value(stats.min)),
        ("Maximum", fmt_value(stats.max)),
        ("Mean", fmt_value(stats.mean)),
        ("Std dev", fmt_value(stats.std_dev)),
        ("Q1", fmt_value(stats.q1)),
        ("Median", fmt_value(stats.median)),
        ("Q3", fmt_value(stats.q3)),
        ("IQR", fmt_value(stats.iqr)),
        ("Low outliers", stats.outliers_low.to_string()),
        ("High outliers", stats.outliers_high.to_string()),
        ("% in tolerance", fmt_percent(stats.percent_in_tolerance)),
    ];

    for (label, value) in lines {
        writer.text_line(&format!("{}: {}", label, value), STATS_SIZE, false)?;
    }
    Ok(())
}

/// Global comparison: the table plus the aggregate bar chart and the
/// overlaid histogram.
fn write_comparison_section(
    writer: &mut PdfWriter,
    table: &ComparisonTable,
    images: &ComparisonImages,
) -> Result<(), AnalysisError> {
    writer.text_line("Global Comparison", SUBHEADING_SIZE, true)?;
    writer.gap(4.0)?;

    let columns = [0.0, 220.0, 310.0, 400.0];
    writer.text_row(
        &[
            (columns[0], "File"),
            (columns[1], "Mean"),
            (columns[2], "Std dev"),
            (columns[3], "% in tolerance"),
        ],
        STATS_SIZE,
        true,
    )?;

    for row in &table.rows {
        let mean = fmt_value(row.mean);
        let std_dev = fmt_value(row.std_dev);
        let percent = fmt_percent(row.percent_in_tolerance);
        writer.text_row(
            &[
                (columns[0], row.name.as_str()),
                (columns[1], mean.as_str()),
                (columns[2], std_dev.as_str()),
                (columns[3], percent.as_str()),
            ],
            STATS_SIZE,
            false,
        )?;
    }

    if let Some(png) = &images.bar {
        writer.gap(8.0)?;
        writer.image(png, PdfWriter::content_width())?;
    }
    if let Some(png) = &images.overlay {
        writer.gap(8.0)?;
        writer.image(png, PdfWriter::content_width())?;
    }

    writer.gap(16.0)?;
    Ok(())
}

fn write_radar_section(
    writer: &mut PdfWriter,
    image: Option<&[u8]>,
) -> Result<(), AnalysisError> {
    writer.text_line("Radar - % in tolerance", SUBHEADING_SIZE, true)?;
    if let Some(png) = image {
        writer.gap(4.0)?;
        writer.image(png, 360.0)?;
    }
    writer.gap(16.0)?;
    Ok(())
}

/// Statistic value for display; undefined values read as `n/a`.
fn fmt_value(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.6}", value)
    }
}

fn fmt_percent(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_stats;
    use crate::models::{CleanSeries, ComparisonRow};
    use crate::parser;

    fn analyzed(name: &str, values: &[f64]) -> DatasetOutcome {
        let series = CleanSeries {
            name: name.to_string(),
            values: values.to_vec(),
            total_count: values.len(),
            nan_removed: 0,
        };
        let stats = compute_stats(&series, 0.003).unwrap();
        DatasetOutcome::Analyzed { series, stats }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn minimal_inputs<'a>(
        outcomes: &'a [DatasetOutcome],
        images: &'a [PerFileImages],
    ) -> ReportInputs<'a> {
        ReportInputs {
            title: "Overlap check",
            date: date(),
            header_image: None,
            outcomes,
            per_file_images: images,
            comparison: None,
            comparison_images: ComparisonImages::default(),
            radar: None,
            radar_image: None,
        }
    }

    /// Content streams are written uncompressed, so text literals can be
    /// searched directly in the document bytes.
    fn extract_all_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).to_string()
    }

    #[test]
    fn test_report_sections_and_order() {
        let outcomes = vec![
            analyzed("a.txt", &[0.001, -0.002, 0.01]),
            analyzed("b.txt", &[0.002]),
        ];
        let images = vec![PerFileImages::default(), PerFileImages::default()];
        let bytes = build_report(&minimal_inputs(&outcomes, &images)).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let text = extract_all_text(&bytes);
        assert!(text.contains("Mesh Overlap Analysis"));
        assert!(text.contains("Title: Overlap check"));
        assert!(text.contains("Date: 15/03/2024"));
        assert!(text.contains("File: a.txt"));
        assert!(text.contains("File: b.txt"));

        // Per-file sections follow upload order.
        let a = text.find("File: a.txt").unwrap();
        let b = text.find("File: b.txt").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_cover_index_lists_failed_datasets() {
        let outcomes = vec![
            analyzed("good.txt", &[0.001]),
            DatasetOutcome::Failed {
                name: "bad.bin".to_string(),
                reason: "dataset 'bad.bin' is not valid UTF-8 text".to_string(),
            },
        ];
        let images = vec![PerFileImages::default(), PerFileImages::default()];
        let bytes = build_report(&minimal_inputs(&outcomes, &images)).unwrap();

        let text = extract_all_text(&bytes);
        assert!(text.contains("- good.txt"));
        assert!(text.contains("- bad.bin"));
        assert!(text.contains("Analysis failed:"));
    }

    #[test]
    fn test_empty_dataset_marked_no_data() {
        let outcomes = vec![analyzed("empty.txt", &[])];
        let images = vec![PerFileImages::default()];
        let bytes = build_report(&minimal_inputs(&outcomes, &images)).unwrap();

        let text = extract_all_text(&bytes);
        assert!(text.contains("No usable data points"));
        assert!(text.contains("% in tolerance: n/a"));
    }

    #[test]
    fn test_comparison_section_only_when_requested() {
        let outcomes = vec![analyzed("a.txt", &[0.001])];
        let images = vec![PerFileImages::default()];

        let without = build_report(&minimal_inputs(&outcomes, &images)).unwrap();
        assert!(!extract_all_text(&without).contains("Global Comparison"));

        let table = ComparisonTable {
            rows: vec![ComparisonRow {
                name: "a.txt".to_string(),
                mean: 0.001,
                std_dev: f64::NAN,
                percent_in_tolerance: 100.0,
            }],
        };
        let mut inputs = minimal_inputs(&outcomes, &images);
        inputs.comparison = Some(&table);
        let with = build_report(&inputs).unwrap();

        let text = extract_all_text(&with);
        assert!(text.contains("Global Comparison"));
        assert!(text.contains("100.00"));
    }

    #[test]
    fn test_radar_section_only_with_vector() {
        let outcomes = vec![
            analyzed("a.txt", &[0.001]),
            analyzed("b.txt", &[0.02]),
        ];
        let images = vec![PerFileImages::default(), PerFileImages::default()];

        let stats: Vec<_> = outcomes.iter().filter_map(|o| o.stats().cloned()).collect();
        let radar = crate::analysis::aggregator::build_radar(&stats).unwrap();

        let mut inputs = minimal_inputs(&outcomes, &images);
        inputs.radar = Some(&radar);
        let bytes = build_report(&inputs).unwrap();
        assert!(extract_all_text(&bytes).contains("Radar - % in tolerance"));
    }

    #[test]
    fn test_bad_header_image_is_skipped() {
        let outcomes = vec![analyzed("a.txt", &[0.001])];
        let images = vec![PerFileImages::default()];

        let mut inputs = minimal_inputs(&outcomes, &images);
        inputs.header_image = Some(b"not a png");

        let bytes = build_report(&inputs).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(extract_all_text(&bytes).contains("File: a.txt"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let outcomes = vec![analyzed("a.txt", &[0.001, -0.002, 0.01])];
        let images = vec![PerFileImages::default()];

        let first = build_report(&minimal_inputs(&outcomes, &images)).unwrap();
        let second = build_report(&minimal_inputs(&outcomes, &images)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_with_rendered_images() {
        use crate::render::{ChartRenderer, ChartStyle, PlaceholderRenderer};

        let series = parser::parse("a.txt", b"0.001\n-0.002\n0.01\n").unwrap();
        let stats = compute_stats(&series, 0.003).unwrap();
        let window = crate::models::ToleranceWindow::symmetric(0.003).unwrap();

        let renderer = PlaceholderRenderer;
        let style = ChartStyle::default();
        let images = vec![PerFileImages {
            histogram: renderer.histogram(&series, &window, &style).ok(),
            scatter: renderer.sorted_scatter(&series, &window, &style).ok(),
        }];
        let outcomes = vec![DatasetOutcome::Analyzed { series, stats }];

        let bytes = build_report(&minimal_inputs(&outcomes, &images)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
