//! Meshtol - Tolerance Analysis and Reporting
//!
//! A CLI tool that reads numeric text datasets (one value per line),
//! filters them against a symmetric tolerance window, and packages
//! per-file and cross-file statistics into a PDF report inside a dated
//! ZIP archive.
//!
//! Exit codes:
//!   0 - Success (report and archive written)
//!   1 - Runtime error (configuration, IO, report assembly)
//!   2 - Every dataset failed to parse

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod parser;
mod render;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use error::AnalysisError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{DatasetOutcome, FileStatistics, ToleranceWindow};
use render::{ChartRenderer, ChartStyle, PlaceholderRenderer};
use report::{ComparisonImages, PerFileImages, ReportInputs};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Meshtol v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run_analysis(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .meshtol.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".meshtol.toml");

    if path.exists() {
        eprintln!("⚠️  .meshtol.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .meshtol.toml")?;

    println!("✅ Created .meshtol.toml with default settings.");
    println!("   Edit it to customize tolerance, chart style, and report sections.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration; configuration failures are fatal before any
    // dataset is touched.
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let tolerance = config.analysis.tolerance;
    let date = args.analysis_date();

    // Handle --dry-run: parse datasets and exit
    if args.dry_run {
        return handle_dry_run(&args.files, tolerance);
    }

    println!("📥 Reading {} dataset(s), tolerance ±{}", args.files.len(), tolerance);

    // Step 1: parse each dataset and compute its statistics, strictly
    // sequentially in upload order. Failures are isolated per dataset.
    let outcomes = process_datasets(&args.files, tolerance, args.quiet);

    let analyzed = outcomes
        .iter()
        .filter(|o| matches!(o, DatasetOutcome::Analyzed { .. }))
        .count();
    let failed = outcomes.len() - analyzed;

    if analyzed == 0 {
        eprintln!("\n⛔ No dataset could be parsed. Nothing to report (exit code 2).");
        return Ok(2);
    }

    let per_file_stats: Vec<FileStatistics> =
        outcomes.iter().filter_map(|o| o.stats().cloned()).collect();

    // Step 2: cross-dataset aggregation (append-only, after all per-file
    // statistics are available). The radar and comparison toggles are
    // applied here, not inside the engine.
    let (comparison_table, radar_vector) = analysis::aggregate(&per_file_stats);
    let comparison = if config.analysis.compare_enabled {
        Some(comparison_table)
    } else {
        None
    };
    let radar = if config.analysis.radar_enabled {
        radar_vector
    } else {
        None
    };

    // Step 3: render chart images. A render failure drops the image,
    // never the section.
    println!("🖼  Rendering charts...");
    let renderer = PlaceholderRenderer;
    let style = ChartStyle::from(&config.chart);
    let window = ToleranceWindow::symmetric(tolerance)?;

    let per_file_images: Vec<PerFileImages> = outcomes
        .iter()
        .map(|outcome| match outcome {
            DatasetOutcome::Analyzed { series, .. } => PerFileImages {
                histogram: check_render(
                    "histogram",
                    series.name.as_str(),
                    renderer.histogram(series, &window, &style),
                ),
                scatter: check_render(
                    "scatter",
                    series.name.as_str(),
                    renderer.sorted_scatter(series, &window, &style),
                ),
            },
            DatasetOutcome::Failed { .. } => PerFileImages::default(),
        })
        .collect();

    let comparison_images = match &comparison {
        Some(table) => {
            let series: Vec<_> = outcomes
                .iter()
                .filter_map(|o| match o {
                    DatasetOutcome::Analyzed { series, .. } => Some(series.clone()),
                    DatasetOutcome::Failed { .. } => None,
                })
                .collect();
            let groups = analysis::group_for_histogram(&series);
            ComparisonImages {
                bar: check_render("comparison bar", "all", renderer.comparison_bar(table, &style)),
                overlay: check_render(
                    "overlay histogram",
                    "all",
                    renderer.overlay_histogram(&groups, &style),
                ),
            }
        }
        None => ComparisonImages::default(),
    };

    let radar_image = radar
        .as_ref()
        .and_then(|vector| check_render("radar", "all", renderer.radar(vector, &style)));

    let header_image = load_header_image(args.header_image.as_deref());

    // Step 4: assemble the document and package the archive.
    println!("📝 Building report...");
    let inputs = ReportInputs {
        title: &args.title,
        date,
        header_image: header_image.as_deref(),
        outcomes: &outcomes,
        per_file_images: &per_file_images,
        comparison: comparison.as_ref(),
        comparison_images,
        radar: radar.as_ref(),
        radar_image,
    };
    let document = report::build_report(&inputs)?;
    let archive = report::package(&document, date)?;
    debug!("{} manifest:\n{}", archive.file_name, archive.manifest);

    // Step 5: write the outputs.
    let output_dir = PathBuf::from(&config.general.output_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;

    let document_path = output_dir.join(&archive.document_name);
    std::fs::write(&document_path, &document)
        .with_context(|| format!("Failed to write report to {}", document_path.display()))?;

    let archive_path = output_dir.join(&archive.file_name);
    std::fs::write(&archive_path, &archive.bytes)
        .with_context(|| format!("Failed to write archive to {}", archive_path.display()))?;

    if let Some(ref stats_path) = args.stats_json {
        let json = serde_json::to_string_pretty(&per_file_stats)
            .context("Failed to serialize statistics")?;
        std::fs::write(stats_path, json)
            .with_context(|| format!("Failed to write statistics to {}", stats_path.display()))?;
    }

    // Print summary
    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📊 Analysis Summary:");
    println!("   Datasets analyzed: {}", analyzed);
    if failed > 0 {
        println!("   Datasets failed: {}", failed);
    }
    for stats in &per_file_stats {
        println!(
            "   - {}: {}/{} in tolerance ({})",
            stats.name,
            stats.selected_count,
            stats.useful_points,
            fmt_percent(stats.percent_in_tolerance)
        );
    }
    println!("   Report: {}", document_path.display());
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Analysis complete! Archive saved to: {}",
        archive_path.display()
    );

    Ok(0)
}

/// Parse every dataset in upload order, isolating per-dataset failures.
fn process_datasets(files: &[PathBuf], tolerance: f64, quiet: bool) -> Vec<DatasetOutcome> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap(),
        );
        pb
    };

    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        let name = dataset_name(file);
        pb.set_message(name.clone());

        let outcome = match std::fs::read(file) {
            Ok(bytes) => match analyze_dataset(&name, &bytes, tolerance) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("{}: {}", name, e);
                    DatasetOutcome::Failed {
                        name: name.clone(),
                        reason: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!("{}: {}", name, e);
                DatasetOutcome::Failed {
                    name: name.clone(),
                    reason: format!("could not read file: {}", e),
                }
            }
        };

        outcomes.push(outcome);
        pb.inc(1);
    }
    pb.finish_and_clear();

    outcomes
}

/// Parse and analyze one dataset.
fn analyze_dataset(
    name: &str,
    bytes: &[u8],
    tolerance: f64,
) -> Result<DatasetOutcome, AnalysisError> {
    let series = parser::parse(name, bytes)?;
    let stats = analysis::compute_stats(&series, tolerance)?;
    info!(
        "{}: {} points, {} useful, {} in tolerance",
        name, stats.total_points, stats.useful_points, stats.selected_count
    );
    Ok(DatasetOutcome::Analyzed { series, stats })
}

/// Handle --dry-run: parse datasets, print what would be reported, exit.
fn handle_dry_run(files: &[PathBuf], tolerance: f64) -> Result<i32> {
    println!("\n🔍 Dry run: parsing datasets (no report)...\n");

    for file in files {
        let name = dataset_name(file);
        match std::fs::read(file).map_err(|e| e.to_string()).and_then(|bytes| {
            analysis::analyze_file(&name, &bytes, tolerance).map_err(|e| e.to_string())
        }) {
            Ok(stats) => println!(
                "   📄 {} ({} lines, {} useful, {} in tolerance)",
                name, stats.total_points, stats.useful_points, stats.selected_count
            ),
            Err(reason) => println!("   ⚠️  {} ({})", name, reason),
        }
    }

    println!("\n✅ Dry run complete. No report was generated.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .meshtol.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Read the optional cover image; a missing or unreadable file only
/// costs the image, never the report.
fn load_header_image(path: Option<&Path>) -> Option<Vec<u8>> {
    let path = path?;
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Skipping header image {}: {}", path.display(), e);
            None
        }
    }
}

/// Unwrap a render result, demoting failures to a logged skip.
fn check_render(
    what: &str,
    dataset: &str,
    result: Result<Vec<u8>, AnalysisError>,
) -> Option<Vec<u8>> {
    match result {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Skipping {} image for {}: {}", what, dataset, e);
            None
        }
    }
}

fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn fmt_percent(value: f64) -> String {
    if value.is_nan() {
        "no data".to_string()
    } else {
        format!("{:.2}%", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name_from_path() {
        assert_eq!(dataset_name(Path::new("data/scan_a.txt")), "scan_a.txt");
        assert_eq!(dataset_name(Path::new("scan_b.txt")), "scan_b.txt");
    }

    #[test]
    fn test_analyze_dataset_outcome() {
        let outcome = analyze_dataset("scan.txt", b"0.001\nabc\n", 0.003).unwrap();
        let stats = outcome.stats().unwrap();
        assert_eq!(stats.total_points, 2);
        assert_eq!(stats.useful_points, 1);
    }

    #[test]
    fn test_process_datasets_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.bin");
        std::fs::write(&good, "0.001\n0.002\n").unwrap();
        std::fs::write(&bad, [0xffu8, 0xfe, 0x00, 0xff]).unwrap();

        let outcomes = process_datasets(&[good, bad], 0.003, true);

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], DatasetOutcome::Analyzed { .. }));
        assert!(matches!(outcomes[1], DatasetOutcome::Failed { .. }));
        // Upload order survives the failure.
        assert_eq!(outcomes[0].name(), "good.txt");
        assert_eq!(outcomes[1].name(), "bad.bin");
    }

    #[test]
    fn test_fmt_percent() {
        assert_eq!(fmt_percent(66.666_666_7), "66.67%");
        assert_eq!(fmt_percent(f64::NAN), "no data");
    }
}
