//! Edge detection step: validated thresholds in, binary edge map out.
//!
//! Thin wrapper over [`crate::canny::canny`]. Returns a binary image where
//! white pixels (255) are edges and black pixels (0) are background.

use image::GrayImage;
use tracing::debug;

use crate::types::ProcessingError;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero lets the hysteresis fill spread across every
/// pixel with any gradient at all, so the mask degenerates into one blob.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Check that a threshold pair is usable.
///
/// # Errors
///
/// Returns [`ProcessingError::InvalidThresholds`] unless both values are
/// finite, at least [`MIN_THRESHOLD`], and `low <= high`.
pub fn validate_thresholds(low: f32, high: f32) -> Result<(), ProcessingError> {
    let valid = low.is_finite() && high.is_finite() && low >= MIN_THRESHOLD && low <= high;
    if valid {
        Ok(())
    } else {
        Err(ProcessingError::InvalidThresholds { low, high })
    }
}

/// Detect edges with hysteresis thresholds `low` and `high`.
///
/// Gradient magnitude is `|gx| + |gy|` of a 3×3 Sobel. Pixels with
/// magnitude strictly above `high` are definite edges; those above `low`
/// but not above `high` are edges only if 8-connected to a definite edge;
/// the rest are discarded.
///
/// # Errors
///
/// Returns [`ProcessingError::InvalidThresholds`] if the thresholds fail
/// [`validate_thresholds`].
pub fn detect_edges(gray: &GrayImage, low: f32, high: f32) -> Result<GrayImage, ProcessingError> {
    validate_thresholds(low, high)?;
    let edges = crate::canny::canny(gray, low, high);
    debug!(
        low,
        high,
        edge_pixels = count_foreground(&edges),
        "edge detection complete",
    );
    Ok(edges)
}

/// Number of non-zero pixels in a binary image.
#[must_use]
pub fn count_foreground(image: &GrayImage) -> u64 {
    image.pixels().map(|p| u64::from(p.0[0] > 0)).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_fn(20, 20, |_, _| image::Luma([255]));
        let edges = detect_edges(&img, 100.0, 200.0).unwrap();
        assert_eq!(edges.dimensions(), (20, 20));
        assert_eq!(count_foreground(&edges), 0, "expected no edges in uniform image");
    }

    #[test]
    fn sharp_edge_detected() {
        let img = GrayImage::from_fn(20, 20, |x, _| image::Luma([if x < 10 { 0 } else { 255 }]));
        let edges = detect_edges(&img, 100.0, 200.0).unwrap();
        assert!(count_foreground(&edges) > 0, "expected edges at sharp boundary");
    }

    fn step(right: u8) -> GrayImage {
        GrayImage::from_fn(40, 40, |x, _| image::Luma([if x < 20 { 0 } else { right }]))
    }

    #[test]
    fn mid_contrast_step_is_an_edge() {
        // 0 -> 60: |gx| = 240, above the high threshold without blurring.
        let edges = detect_edges(&step(60), 100.0, 200.0).unwrap();
        assert_eq!(count_foreground(&edges), 40);
    }

    #[test]
    fn step_at_exactly_high_threshold_is_not_an_edge() {
        // 0 -> 50: |gx| = 200, which does not exceed 200.
        let edges = detect_edges(&step(50), 100.0, 200.0).unwrap();
        assert_eq!(count_foreground(&edges), 0);
    }

    #[test]
    fn low_above_high_is_rejected() {
        let img = GrayImage::new(8, 8);
        let result = detect_edges(&img, 200.0, 100.0);
        assert!(matches!(
            result,
            Err(ProcessingError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn thresholds_below_minimum_are_rejected() {
        assert!(validate_thresholds(0.0, 200.0).is_err());
        assert!(validate_thresholds(-5.0, 200.0).is_err());
        assert!(validate_thresholds(MIN_THRESHOLD, MIN_THRESHOLD).is_ok());
    }

    #[test]
    fn non_finite_thresholds_are_rejected() {
        assert!(validate_thresholds(f32::NAN, 200.0).is_err());
        assert!(validate_thresholds(100.0, f32::INFINITY).is_err());
    }

    #[test]
    fn equal_thresholds_are_accepted() {
        assert!(validate_thresholds(150.0, 150.0).is_ok());
    }
}
