//! Level extraction: binary mask in, horizontal centroids out.

use image::GrayImage;
use tracing::{debug, trace};

use crate::contour::find_external_contours;
use crate::moments::{Moments, contour_area};
use crate::types::{Contour, ExtractionError, LevelOrder, LevelsConfig};

/// Extract one level per qualifying external contour of `mask`.
///
/// Each level is the x-coordinate of the contour's centroid,
/// `M10 / M00`. Contours enclosing less than `config.min_contour_area`
/// square pixels are skipped. See [`LevelOrder`] for the ordering.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidMinArea`] for a negative or
/// non-finite area floor, and [`ExtractionError::DegenerateContour`] if a
/// contour that passes the floor has a zero area moment.
pub fn extract_marked_levels(
    mask: &GrayImage,
    config: &LevelsConfig,
) -> Result<Vec<f64>, ExtractionError> {
    let contours = find_external_contours(mask);
    levels_from_contours(&contours, config.min_contour_area, config.level_order)
}

/// Check that an area floor is usable.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidMinArea`] unless `min_area` is finite
/// and non-negative.
pub fn validate_min_area(min_area: f64) -> Result<(), ExtractionError> {
    if min_area.is_finite() && min_area >= 0.0 {
        Ok(())
    } else {
        Err(ExtractionError::InvalidMinArea(min_area))
    }
}

/// Filter `contours` by area and compute the centroid x of the rest.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidMinArea`] if `min_area` fails
/// [`validate_min_area`], and [`ExtractionError::DegenerateContour`] if a
/// contour with area at least `min_area` has a zero area moment (only
/// possible when `min_area` is zero).
pub fn levels_from_contours(
    contours: &[Contour],
    min_area: f64,
    order: LevelOrder,
) -> Result<Vec<f64>, ExtractionError> {
    validate_min_area(min_area)?;
    let mut levels = Vec::with_capacity(contours.len());

    for (index, contour) in contours.iter().enumerate() {
        let area = contour_area(contour);
        if area < min_area {
            trace!(index, area, min_area, "skipping contour below area floor");
            continue;
        }
        let centroid = Moments::of(contour)
            .centroid()
            .ok_or(ExtractionError::DegenerateContour { index })?;
        levels.push(centroid.x);
    }

    if order == LevelOrder::Ascending {
        levels.sort_by(f64::total_cmp);
    }

    debug!(
        contours = contours.len(),
        levels = levels.len(),
        ?order,
        "level extraction complete",
    );
    Ok(levels)
}
