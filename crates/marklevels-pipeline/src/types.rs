//! Shared types for the marked-level pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `DynamicImage`, the decoded form of an input file.
pub use image::DynamicImage;

/// Integer pixel coordinate, as produced by border following.
pub type PixelPoint = imageproc::point::Point<u32>;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Closed boundary of a foreground region in a binary mask.
///
/// Points are pixel centres in traversal order. The last point connects
/// back to the first; the closing point is not repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour(Vec<PixelPoint>);

impl Contour {
    /// Create a contour from its boundary points.
    #[must_use]
    pub const fn new(points: Vec<PixelPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[PixelPoint] {
        &self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Order in which extracted levels are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOrder {
    /// The order contours are discovered by the border-following scan:
    /// by the first pixel of each contour, top-to-bottom, then
    /// left-to-right. Unrelated to price; do not rely on it for ranking.
    ///
    /// OpenCV's `findContours` lists external contours the other way
    /// round (last discovered first, so bottom-to-top), so for the same
    /// mask this order is the reverse of OpenCV's.
    #[default]
    Discovery,
    /// Sorted by x-coordinate, smallest first.
    Ascending,
}

/// Tunable parameters of the pipeline.
///
/// The defaults are the documented behavior: Canny thresholds of 100 and
/// 200, a 3×3 structuring element, and a 10 px² noise floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    /// Canny hysteresis low threshold. Gradient magnitudes above
    /// `canny_low` and not above `canny_high` are edges only when
    /// connected to a strong edge.
    pub canny_low: f32,

    /// Canny hysteresis high threshold. Gradient magnitudes strictly
    /// above this value are definite edges. Magnitudes are
    /// `|gx| + |gy|` of a 3×3 Sobel on the unblurred grayscale.
    pub canny_high: f32,

    /// Radius of the square structuring element used for the dilate and
    /// erode passes. A radius of 1 is a 3×3 all-ones element.
    pub morph_radius: u8,

    /// Contours enclosing less than this many square pixels are noise.
    pub min_contour_area: f64,

    /// Ordering of the returned levels.
    pub level_order: LevelOrder,
}

impl LevelsConfig {
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 100.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 200.0;
    /// Default structuring element radius (3×3).
    pub const DEFAULT_MORPH_RADIUS: u8 = 1;
    /// Default minimum contour area in square pixels.
    pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 10.0;
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            morph_radius: Self::DEFAULT_MORPH_RADIUS,
            min_contour_area: Self::DEFAULT_MIN_CONTOUR_AREA,
            level_order: LevelOrder::default(),
        }
    }
}

/// Intermediate rasters from one run of the preprocessor.
///
/// All images share the dimensions of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Single-channel luminance image.
    pub grayscale: GrayImage,
    /// Canny output (0 or 255).
    pub edges: GrayImage,
    /// Edges after one dilation pass.
    pub dilated: GrayImage,
    /// Final binary mask: `dilated` after one erosion pass.
    pub mask: GrayImage,
}

impl ProcessedImage {
    /// Dimensions shared by every stage image.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.mask.width(),
            height: self.mask.height(),
        }
    }
}

/// Uniform outcome of [`get_marked_levels`](crate::get_marked_levels).
///
/// Serializes to exactly one of `{"marked_levels": [...]}` or
/// `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelsOutcome {
    /// Horizontal centroid of every qualifying contour.
    MarkedLevels(Vec<f64>),
    /// Human-readable description of the failure.
    Error(String),
}

impl LevelsOutcome {
    /// The extracted levels, or `None` on failure.
    #[must_use]
    pub fn levels(&self) -> Option<&[f64]> {
        match self {
            Self::MarkedLevels(levels) => Some(levels),
            Self::Error(_) => None,
        }
    }

    /// The error message, or `None` on success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::MarkedLevels(_) => None,
            Self::Error(message) => Some(message),
        }
    }

    /// Returns `true` if the pipeline failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<Result<Vec<f64>, LevelsError>> for LevelsOutcome {
    fn from(result: Result<Vec<f64>, LevelsError>) -> Self {
        match result {
            Ok(levels) => Self::MarkedLevels(levels),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// Failure to obtain a decoded image.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The file could not be opened or read.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The input image data was empty.
    #[error("input image data is empty")]
    Empty,

    /// The data is not an image in any supported format, or is corrupt.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Failure during grayscale conversion, edge detection, or morphology.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// The image has no pixels.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// Canny thresholds must be finite, at least
    /// [`MIN_THRESHOLD`](crate::edge::MIN_THRESHOLD), and ordered.
    #[error("invalid Canny thresholds: low={low}, high={high}")]
    InvalidThresholds {
        /// Requested low threshold.
        low: f32,
        /// Requested high threshold.
        high: f32,
    },

    /// The structuring element radius is zero.
    #[error("structuring element radius must be at least 1")]
    InvalidRadius,
}

/// Failure during contour finding or moment computation.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// A contour passed the area filter but has a zero area moment, so its
    /// centroid is undefined.
    #[error("contour {index} has a zero area moment; centroid is undefined")]
    DegenerateContour {
        /// Discovery index of the contour.
        index: usize,
    },

    /// The minimum area is negative or not finite.
    #[error("minimum contour area must be finite and non-negative, got {0}")]
    InvalidMinArea(f64),
}

/// Errors from any stage of the pipeline.
///
/// The `Display` output carries the stage prefix callers match on:
/// `Error reading image:`, `Error processing image:`, or
/// `Error extracting marked levels:`.
#[derive(Debug, thiserror::Error)]
pub enum LevelsError {
    /// The image could not be read or decoded.
    #[error("Error reading image: {0}")]
    Read(#[from] ReadError),

    /// Preprocessing failed.
    #[error("Error processing image: {0}")]
    Processing(#[from] ProcessingError),

    /// Contour extraction or centroid computation failed.
    #[error("Error extracting marked levels: {0}")]
    Extraction(#[from] ExtractionError),
}
