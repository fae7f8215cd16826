//! Preprocessing: color or grayscale image in, binary edge mask out.
//!
//! grayscale -> Canny -> dilate -> erode, as a chain of stage types
//! ([`Grayscaled`] -> [`EdgesDetected`] -> [`ProcessedImage`]) so that
//! callers timing individual stages run exactly the same steps.

use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::types::{LevelsConfig, ProcessedImage, ProcessingError};
use crate::{edge, grayscale, morphology};

/// Run the preprocessor and return only the final mask.
///
/// The mask has the dimensions of `image` and contains only 0 and 255.
///
/// # Errors
///
/// See [`process_image_staged`].
pub fn process_image(
    image: &DynamicImage,
    config: &LevelsConfig,
) -> Result<GrayImage, ProcessingError> {
    Ok(process_image_staged(image, config)?.mask)
}

/// Run the preprocessor and keep every intermediate raster.
///
/// # Errors
///
/// Returns [`ProcessingError::EmptyImage`] if the image has no pixels,
/// [`ProcessingError::InvalidThresholds`] for unusable Canny thresholds,
/// and [`ProcessingError::InvalidRadius`] for a zero structuring element
/// radius.
pub fn process_image_staged(
    image: &DynamicImage,
    config: &LevelsConfig,
) -> Result<ProcessedImage, ProcessingError> {
    Grayscaled::from_image(image)?
        .detect_edges(config)?
        .close(config.morph_radius)
}

/// Stage 1 output: a non-empty image reduced to luminance.
#[derive(Debug, Clone)]
pub struct Grayscaled {
    grayscale: GrayImage,
}

impl Grayscaled {
    /// Check that `image` has pixels and convert it to grayscale.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::EmptyImage`] if either dimension is zero.
    pub fn from_image(image: &DynamicImage) -> Result<Self, ProcessingError> {
        check_not_empty(image.width(), image.height())?;
        Ok(Self {
            grayscale: grayscale::to_grayscale(image),
        })
    }

    /// The luminance image.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.grayscale
    }

    /// Run Canny with the thresholds from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidThresholds`] for unusable
    /// thresholds.
    pub fn detect_edges(self, config: &LevelsConfig) -> Result<EdgesDetected, ProcessingError> {
        let edges = edge::detect_edges(&self.grayscale, config.canny_low, config.canny_high)?;
        Ok(EdgesDetected {
            grayscale: self.grayscale,
            edges,
        })
    }
}

/// Stage 2 output: the binary Canny edge map.
#[derive(Debug, Clone)]
pub struct EdgesDetected {
    grayscale: GrayImage,
    edges: GrayImage,
}

impl EdgesDetected {
    /// The Canny output (0 or 255).
    #[must_use]
    pub const fn edges(&self) -> &GrayImage {
        &self.edges
    }

    /// Morphological closing: one dilation, then one erosion, both with a
    /// square element of `radius`. Bridges one-pixel breaks in the edge
    /// outlines so that each marked region traces as one closed contour.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidRadius`] for a zero radius.
    pub fn close(self, radius: u8) -> Result<ProcessedImage, ProcessingError> {
        let dilated = morphology::dilate(&self.edges, radius)?;
        let mask = morphology::erode(&dilated, radius)?;

        debug!(
            width = mask.width(),
            height = mask.height(),
            mask_pixels = edge::count_foreground(&mask),
            "preprocessing complete",
        );
        Ok(ProcessedImage {
            grayscale: self.grayscale,
            edges: self.edges,
            dilated,
            mask,
        })
    }
}

/// Reject images with a zero dimension.
const fn check_not_empty(width: u32, height: u32) -> Result<(), ProcessingError> {
    if width == 0 || height == 0 {
        Err(ProcessingError::EmptyImage { width, height })
    } else {
        Ok(())
    }
}
