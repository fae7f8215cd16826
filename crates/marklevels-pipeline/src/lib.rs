//! marklevels-pipeline: locate marked price levels on a chart image.
//!
//! The pipeline is four stages, each a plain function:
//!
//! 1. [`read_image`]: file path -> decoded image.
//! 2. [`process_image`]: image -> binary mask (grayscale, Canny with
//!    thresholds 100/200, one 3×3 dilation, one 3×3 erosion).
//! 3. [`extract_marked_levels`]: mask -> x-centroid of every external
//!    contour enclosing at least 10 px².
//! 4. [`get_marked_levels`]: runs 1-3 and folds the result or the first
//!    error into a [`LevelsOutcome`].
//!
//! Nothing is cached between calls; the same file always yields the same
//! levels.

pub mod canny;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod levels;
pub mod loader;
pub mod moments;
pub mod morphology;
pub mod preprocess;
pub mod types;

use std::path::Path;

use tracing::debug;

pub use levels::extract_marked_levels;
pub use loader::{decode_image, read_image};
pub use preprocess::{EdgesDetected, Grayscaled, process_image, process_image_staged};
pub use types::{
    Contour, Dimensions, DynamicImage, ExtractionError, GrayImage, LevelOrder, LevelsConfig,
    LevelsError, LevelsOutcome, PixelPoint, Point, ProcessedImage, ProcessingError, ReadError,
};

/// Run the full pipeline on the image at `path`.
///
/// Any stage failure aborts the remaining stages; there are no partial
/// results.
///
/// # Errors
///
/// Returns [`LevelsError::Read`], [`LevelsError::Processing`], or
/// [`LevelsError::Extraction`] depending on the failing stage.
pub fn try_get_marked_levels(
    path: impl AsRef<Path>,
    config: &LevelsConfig,
) -> Result<Vec<f64>, LevelsError> {
    let path = path.as_ref();
    let image = read_image(path)?;
    let mask = process_image(&image, config)?;
    let levels = extract_marked_levels(&mask, config)?;
    debug!(path = %path.display(), levels = levels.len(), "marked levels extracted");
    Ok(levels)
}

/// Extract marked levels from the image at `path` with `config`.
///
/// Failures are rendered into [`LevelsOutcome::Error`] with their stage
/// prefix; callers distinguish success from failure by the variant.
#[must_use]
pub fn get_marked_levels_with(path: impl AsRef<Path>, config: &LevelsConfig) -> LevelsOutcome {
    try_get_marked_levels(path, config).into()
}

/// Extract marked levels from the image at `path` with the default
/// configuration.
#[must_use]
pub fn get_marked_levels(path: impl AsRef<Path>) -> LevelsOutcome {
    get_marked_levels_with(path, &LevelsConfig::default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = get_marked_levels(dir.path().join("nonexistent_image.png"));
        let message = outcome.error().unwrap();
        assert!(message.starts_with("Error reading image:"), "{message}");
    }

    #[test]
    fn blank_chart_has_no_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        assert_eq!(get_marked_levels(&path), LevelsOutcome::MarkedLevels(Vec::new()));
    }

    #[test]
    fn typed_error_variant_matches_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let bad_thresholds = LevelsConfig {
            canny_low: 0.0,
            ..LevelsConfig::default()
        };
        assert!(matches!(
            try_get_marked_levels(&path, &bad_thresholds),
            Err(LevelsError::Processing(_))
        ));

        let bad_area = LevelsConfig {
            min_contour_area: -1.0,
            ..LevelsConfig::default()
        };
        assert!(matches!(
            try_get_marked_levels(&path, &bad_area),
            Err(LevelsError::Extraction(_))
        ));
    }
}
