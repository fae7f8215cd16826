//! marklevels: print the marked price levels found on a chart image.
//!
//! Runs the edge-detection and contour pipeline on one image and prints
//! the horizontal centroid of every marked region, or the error that
//! stopped the pipeline.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin marklevels -- [OPTIONS] [IMAGE]
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `warn`, or `debug` with `--verbose`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use marklevels_pipeline::diagnostics::{Clock, DiagnosedRun, run_with_diagnostics};
use marklevels_pipeline::{
    LevelOrder, LevelsConfig, LevelsOutcome, ProcessedImage, get_marked_levels_with,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Extract marked price levels from a stock-chart image.
///
/// Prints `Marked Levels: [...]` on success or `Error: ...` on failure.
#[derive(Parser)]
#[command(name = "marklevels", version)]
struct Cli {
    /// Path to the chart image (PNG, JPEG, BMP, WebP).
    #[arg(default_value = "AssignmentImage-2.png")]
    image_path: PathBuf,

    /// Canny low threshold.
    #[arg(long, default_value_t = LevelsConfig::DEFAULT_CANNY_LOW)]
    canny_low: f32,

    /// Canny high threshold.
    #[arg(long, default_value_t = LevelsConfig::DEFAULT_CANNY_HIGH)]
    canny_high: f32,

    /// Structuring element radius for the dilate/erode passes (1 = 3x3).
    #[arg(long, default_value_t = LevelsConfig::DEFAULT_MORPH_RADIUS)]
    morph_radius: u8,

    /// Minimum contour area in square pixels.
    #[arg(long, default_value_t = LevelsConfig::DEFAULT_MIN_CONTOUR_AREA)]
    min_area: f64,

    /// Sort levels by x instead of reporting them in discovery order.
    #[arg(long)]
    sort: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Missing fields take their default values.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the result as JSON: `{"marked_levels": [...]}` or
    /// `{"error": "..."}`.
    #[arg(long)]
    json: bool,

    /// Print per-stage timing and counts to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Write the intermediate images (grayscale, edges, dilated, mask)
    /// as PNGs into this directory.
    #[arg(long, value_name = "DIR")]
    dump_dir: Option<PathBuf>,

    /// Log pipeline progress (same as `RUST_LOG=debug`).
    #[arg(short, long)]
    verbose: bool,
}

/// Build a [`LevelsConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<LevelsConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(LevelsConfig {
        canny_low: cli.canny_low,
        canny_high: cli.canny_high,
        morph_radius: cli.morph_radius,
        min_contour_area: cli.min_area,
        level_order: if cli.sort {
            LevelOrder::Ascending
        } else {
            LevelOrder::Discovery
        },
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Write each intermediate raster as `<dir>/<stage>.png`.
fn dump_stages(dir: &Path, processed: &ProcessedImage) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let stages = [
        ("grayscale", &processed.grayscale),
        ("edges", &processed.edges),
        ("dilated", &processed.dilated),
        ("mask", &processed.mask),
    ];
    for (name, image) in stages {
        let path = dir.join(format!("{name}.png"));
        image
            .save(&path)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        info!(path = %path.display(), "wrote stage image");
    }
    Ok(())
}

/// Run the pipeline with diagnostics and fold the result into an outcome,
/// reporting and dumping along the way.
fn run_diagnosed(cli: &Cli, config: &LevelsConfig) -> LevelsOutcome {
    match run_with_diagnostics(&cli.image_path, config, &StdClock) {
        Ok(DiagnosedRun {
            levels,
            processed,
            diagnostics,
        }) => {
            if cli.diagnostics {
                eprintln!("{}", diagnostics.report());
                eprintln!();
            }
            if let Some(ref dir) = cli.dump_dir
                && let Err(msg) = dump_stages(dir, &processed)
            {
                warn!("{msg}");
            }
            LevelsOutcome::MarkedLevels(levels)
        }
        Err(e) => LevelsOutcome::Error(e.to_string()),
    }
}

fn print_outcome(outcome: &LevelsOutcome, json: bool) -> Result<(), String> {
    if json {
        let text = serde_json::to_string(outcome)
            .map_err(|e| format!("Error serializing result: {e}"))?;
        println!("{text}");
        return Ok(());
    }

    match outcome {
        LevelsOutcome::MarkedLevels(levels) => println!("Marked Levels: {levels:?}"),
        LevelsOutcome::Error(message) => println!("Error: {message}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    info!(image = %cli.image_path.display(), ?config, "extracting marked levels");

    let outcome = if cli.diagnostics || cli.dump_dir.is_some() {
        run_diagnosed(&cli, &config)
    } else {
        get_marked_levels_with(&cli.image_path, &config)
    };

    if let Err(msg) = print_outcome(&outcome, cli.json) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
