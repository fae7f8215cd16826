//! Binary dilation and erosion with a square structuring element.
//!
//! Any non-zero pixel is foreground. Outputs are 0 or 255. A radius `r`
//! corresponds to a `(2r + 1) × (2r + 1)` all-ones element, i.e. the
//! chessboard (`L∞`) distance ball of radius `r`. Pixels outside the image
//! never influence the result.

use image::GrayImage;
use imageproc::distance_transform::Norm;

use crate::types::ProcessingError;

/// Grow foreground regions by `radius` pixels in all eight directions.
///
/// # Errors
///
/// Returns [`ProcessingError::InvalidRadius`] if `radius` is zero.
pub fn dilate(mask: &GrayImage, radius: u8) -> Result<GrayImage, ProcessingError> {
    check_radius(radius)?;
    Ok(imageproc::morphology::dilate(mask, Norm::LInf, radius))
}

/// Shrink foreground regions by `radius` pixels in all eight directions.
///
/// # Errors
///
/// Returns [`ProcessingError::InvalidRadius`] if `radius` is zero.
pub fn erode(mask: &GrayImage, radius: u8) -> Result<GrayImage, ProcessingError> {
    check_radius(radius)?;
    Ok(imageproc::morphology::erode(mask, Norm::LInf, radius))
}

const fn check_radius(radius: u8) -> Result<(), ProcessingError> {
    if radius == 0 {
        Err(ProcessingError::InvalidRadius)
    } else {
        Ok(())
    }
}
