//! Pipeline diagnostics: timing and counts for each stage.
//!
//! [`run_with_diagnostics`] runs the same stages as
//! [`try_get_marked_levels`](crate::try_get_marked_levels) and records
//! how long each took and what it produced. Intended for threshold tuning
//! and for understanding why a chart yields more or fewer levels than
//! expected.
//!
//! Time is read through the [`Clock`] trait so tests can substitute a
//! deterministic clock. Durations serialize as fractional seconds.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::preprocess::Grayscaled;
use crate::types::{Dimensions, LevelsConfig, LevelsError, ProcessedImage};
use crate::{contour, edge, levels, loader};

/// Source of monotonic time.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 0: file read and decode.
    pub read: StageDiagnostics,
    /// Stage 1: grayscale conversion.
    pub grayscale: StageDiagnostics,
    /// Stage 2: Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// Stage 3: dilate + erode.
    pub morphology: StageDiagnostics,
    /// Stage 4: external contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Stage 5: area filter and centroids.
    pub level_extraction: StageDiagnostics,
    /// Wall-clock duration of the whole run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Decoded image size.
    Read {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Grayscale conversion.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Canny edge detection.
    EdgeDetection {
        /// Low hysteresis threshold.
        low_threshold: f32,
        /// High hysteresis threshold.
        high_threshold: f32,
        /// Number of edge pixels in the output.
        edge_pixel_count: u64,
        /// Total pixel count, for edge density.
        total_pixel_count: u64,
    },
    /// Dilation followed by erosion.
    Morphology {
        /// Structuring element radius.
        radius: u8,
        /// Foreground pixels after dilation.
        dilated_pixel_count: u64,
        /// Foreground pixels after erosion (the final mask).
        mask_pixel_count: u64,
    },
    /// External contour tracing.
    ContourTracing {
        /// Number of external contours.
        contour_count: usize,
        /// Total points across all contours after chain approximation.
        total_point_count: usize,
    },
    /// Area filter and centroid computation.
    LevelExtraction {
        /// Area floor in square pixels.
        min_area: f64,
        /// Contours that produced a level.
        retained: usize,
        /// Contours skipped as noise.
        discarded: usize,
    },
}

/// High-level summary counts for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image dimensions.
    pub dimensions: Dimensions,
    /// Number of external contours.
    pub contour_count: usize,
    /// Number of levels reported.
    pub level_count: usize,
}

/// Everything produced by a diagnosed run.
#[derive(Debug, Clone)]
pub struct DiagnosedRun {
    /// Extracted levels, as returned by the plain pipeline.
    pub levels: Vec<f64>,
    /// Intermediate rasters.
    pub processed: ProcessedImage,
    /// Per-stage timings and counts.
    pub diagnostics: PipelineDiagnostics,
}

/// Run `f`, returning its output and how long it took.
fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let out = f();
    (out, clock.elapsed(&start))
}

/// Run the full pipeline on the image at `path`, collecting diagnostics.
///
/// # Errors
///
/// Fails exactly where [`try_get_marked_levels`](crate::try_get_marked_levels)
/// fails, with the same [`LevelsError`].
pub fn run_with_diagnostics<C: Clock>(
    path: impl AsRef<Path>,
    config: &LevelsConfig,
    clock: &C,
) -> Result<DiagnosedRun, LevelsError> {
    let run_start = clock.now();

    let (image, read_duration) = timed(clock, || loader::read_image(path));
    let image = image?;
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };

    let (gray, grayscale_duration) = timed(clock, || Grayscaled::from_image(&image));
    let gray = gray?;
    let gray_dimensions = gray.grayscale().dimensions();

    let (edges, edge_duration) = timed(clock, || gray.detect_edges(config));
    let edges = edges?;
    let edge_pixel_count = edge::count_foreground(edges.edges());

    let (processed, morphology_duration) = timed(clock, || edges.close(config.morph_radius));
    let processed = processed?;

    let (contours, contour_duration) =
        timed(clock, || contour::find_external_contours(&processed.mask));

    let (found, level_duration) = timed(clock, || {
        levels::levels_from_contours(&contours, config.min_contour_area, config.level_order)
    });
    let found = found?;

    let total_duration = clock.elapsed(&run_start);

    let diagnostics = PipelineDiagnostics {
        read: StageDiagnostics {
            duration: read_duration,
            metrics: StageMetrics::Read {
                width: dimensions.width,
                height: dimensions.height,
            },
        },
        grayscale: StageDiagnostics {
            duration: grayscale_duration,
            metrics: StageMetrics::Grayscale {
                width: gray_dimensions.0,
                height: gray_dimensions.1,
            },
        },
        edge_detection: StageDiagnostics {
            duration: edge_duration,
            metrics: StageMetrics::EdgeDetection {
                low_threshold: config.canny_low,
                high_threshold: config.canny_high,
                edge_pixel_count,
                total_pixel_count: dimensions.pixel_count(),
            },
        },
        morphology: StageDiagnostics {
            duration: morphology_duration,
            metrics: StageMetrics::Morphology {
                radius: config.morph_radius,
                dilated_pixel_count: edge::count_foreground(&processed.dilated),
                mask_pixel_count: edge::count_foreground(&processed.mask),
            },
        },
        contour_tracing: StageDiagnostics {
            duration: contour_duration,
            metrics: StageMetrics::ContourTracing {
                contour_count: contours.len(),
                total_point_count: contours.iter().map(crate::Contour::len).sum(),
            },
        },
        level_extraction: StageDiagnostics {
            duration: level_duration,
            metrics: StageMetrics::LevelExtraction {
                min_area: config.min_contour_area,
                retained: found.len(),
                discarded: contours.len() - found.len(),
            },
        },
        total_duration,
        summary: PipelineSummary {
            dimensions,
            contour_count: contours.len(),
            level_count: found.len(),
        },
    };

    Ok(DiagnosedRun {
        levels: found,
        processed,
        diagnostics,
    })
}

impl PipelineDiagnostics {
    /// Stage names paired with their diagnostics, in pipeline order.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 6] {
        [
            ("Read", &self.read),
            ("Grayscale", &self.grayscale),
            ("Edge Detection", &self.edge_detection),
            ("Morphology", &self.morphology),
            ("Contour Tracing", &self.contour_tracing),
            ("Level Extraction", &self.level_extraction),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.dimensions.width,
            self.summary.dimensions.height,
            self.summary.dimensions.pixel_count(),
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Levels: {}",
            self.summary.contour_count, self.summary.level_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Read { width, height } | StageMetrics::Grayscale { width, height } => {
            format!("{width}x{height}")
        }
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} edges={edge_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::Morphology {
            radius,
            dilated_pixel_count,
            mask_pixel_count,
        } => format!("radius={radius} dilated={dilated_pixel_count} mask={mask_pixel_count}"),
        StageMetrics::ContourTracing {
            contour_count,
            total_point_count,
        } => format!("{contour_count} contours, {total_point_count} pts"),
        StageMetrics::LevelExtraction {
            min_area,
            retained,
            discarded,
        } => format!("min_area={min_area:.1} kept={retained} dropped={discarded}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Every measurement takes exactly one millisecond.
    struct FixedClock;

    impl Clock for FixedClock {
        type Instant = ();

        fn now(&self) {}

        fn elapsed(&self, _since: &()) -> Duration {
            Duration::from_millis(1)
        }
    }

    fn write_chart(dir: &Path) -> std::path::PathBuf {
        let img = RgbImage::from_fn(120, 60, |x, y| {
            let in_bar = (20..40).contains(&x) || (70..90).contains(&x);
            if in_bar && (15..45).contains(&y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let path = dir.join("chart.png");
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn diagnosed_run_matches_plain_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chart(dir.path());
        let config = LevelsConfig::default();

        let run = run_with_diagnostics(&path, &config, &FixedClock).unwrap();
        let plain = crate::try_get_marked_levels(&path, &config).unwrap();
        assert_eq!(run.levels, plain);
        assert_eq!(run.diagnostics.summary.level_count, plain.len());
        assert_eq!(
            run.processed.mask,
            crate::process_image(&crate::read_image(&path).unwrap(), &config).unwrap()
        );
    }

    #[test]
    fn diagnosed_run_matches_plain_pipeline_across_configs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chart(dir.path());
        let image = crate::read_image(&path).unwrap();
        let default = LevelsConfig::default();
        let configs = [
            default,
            LevelsConfig { morph_radius: 2, ..default },
            LevelsConfig { canny_low: 50.0, canny_high: 150.0, ..default },
            LevelsConfig { level_order: crate::LevelOrder::Ascending, ..default },
            LevelsConfig { min_contour_area: 10_000.0, ..default },
            LevelsConfig { canny_low: 300.0, ..default },
            LevelsConfig { min_contour_area: -1.0, ..default },
        ];

        for config in configs {
            let run = run_with_diagnostics(&path, &config, &FixedClock);
            let plain = crate::try_get_marked_levels(&path, &config);
            match (run, plain) {
                (Ok(run), Ok(plain)) => {
                    assert_eq!(run.levels, plain, "{config:?}");
                    assert_eq!(
                        run.processed,
                        crate::process_image_staged(&image, &config).unwrap(),
                        "{config:?}"
                    );
                }
                (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string(), "{config:?}"),
                (run, plain) => panic!("{config:?}: diagnosed {run:?} vs plain {plain:?}"),
            }
        }
    }

    #[test]
    fn report_lists_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chart(dir.path());
        let run = run_with_diagnostics(&path, &LevelsConfig::default(), &FixedClock).unwrap();
        let report = run.diagnostics.report();
        for (name, _) in run.diagnostics.stages() {
            assert!(report.contains(name), "missing {name} in\n{report}");
        }
        assert!(report.contains("Image: 120x60 (7200 pixels)"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chart(dir.path());
        let run = run_with_diagnostics(&path, &LevelsConfig::default(), &FixedClock).unwrap();
        let json = serde_json::to_value(&run.diagnostics).unwrap();
        assert_eq!(json["total_duration"], serde_json::json!(0.001));
        assert_eq!(json["read"]["duration"], serde_json::json!(0.001));
    }

    #[test]
    fn missing_file_fails_like_plain_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_with_diagnostics(
            dir.path().join("missing.png"),
            &LevelsConfig::default(),
            &FixedClock,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Error reading image:"));
    }
}
