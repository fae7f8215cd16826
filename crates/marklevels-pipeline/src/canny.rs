//! Canny edge detection with OpenCV's default conventions.
//!
//! Sobel gradients, non-maximum suppression, hysteresis. Unlike
//! `imageproc::edges::canny` there is no Gaussian pre-blur and gradient
//! strength is the L1 norm `|gx| + |gy|`, so the thresholds select the
//! same edges as `cv2.Canny(gray, low, high)`:
//!
//! - a pixel is a candidate only when its strength is strictly above
//!   `low`, and seeds an edge only when strictly above `high`;
//! - along a horizontal or vertical gradient a tie keeps the first
//!   (left or upper) pixel, so a straight step yields a one-pixel edge.
//!
//! The hysteresis flood fill visits all eight neighbours and bounds-checks
//! each one. In `imageproc 0.26` the fill skips the north and north-east
//! neighbours and underflows when it reaches row or column 0
//! (<https://github.com/image-rs/imageproc/issues/705>).

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// `tan(22.5°)` in fixed point with [`FIXED_SHIFT`] fractional bits.
const TAN_22_5: i64 = 13_573;
const FIXED_SHIFT: u32 = 15;

const EDGE: Luma<u8> = Luma([255]);

/// Run Canny edge detection.
///
/// Returns a binary image: 255 for edge pixels, 0 elsewhere. Callers must
/// pass `low_threshold <= high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    debug_assert!(low_threshold <= high_threshold);

    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude: Image<Luma<i32>> = Image::from_fn(image.width(), image.height(), |x, y| {
        let h = i32::from(gx.get_pixel(x, y).0[0]);
        let v = i32::from(gy.get_pixel(x, y).0[0]);
        Luma([h.abs() + v.abs()])
    });

    let candidates = non_maximum_suppression(&magnitude, &gx, &gy, low_threshold);
    hysteresis(&candidates, high_threshold)
}

/// Gradient direction quantized to the four pixel-grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Diagonal,
    Vertical,
    AntiDiagonal,
}

impl Direction {
    /// Sector of the gradient `(gx, gy)`, split at 22.5° and 67.5°.
    fn of(gx: i32, gy: i32) -> Self {
        let ax = i64::from(gx).abs();
        let ay = i64::from(gy).abs() << FIXED_SHIFT;
        let tan_22 = ax * TAN_22_5;
        if ay < tan_22 {
            return Self::Horizontal;
        }
        let tan_67 = tan_22 + (ax << (FIXED_SHIFT + 1));
        if ay > tan_67 {
            Self::Vertical
        } else if (gx ^ gy) < 0 {
            Self::AntiDiagonal
        } else {
            Self::Diagonal
        }
    }

    /// Offsets of the two neighbours compared along the gradient,
    /// backward first.
    const fn offsets(self) -> [(i32, i32); 2] {
        match self {
            Self::Horizontal => [(-1, 0), (1, 0)],
            Self::Vertical => [(0, -1), (0, 1)],
            Self::Diagonal => [(-1, -1), (1, 1)],
            Self::AntiDiagonal => [(1, -1), (-1, 1)],
        }
    }

    /// Whether a pixel may equal its forward neighbour and still be kept.
    const fn keeps_forward_tie(self) -> bool {
        matches!(self, Self::Horizontal | Self::Vertical)
    }
}

/// Strength at `(x + dx, y + dy)`, or 0 outside the image.
fn magnitude_at(magnitude: &Image<Luma<i32>>, x: u32, y: u32, (dx, dy): (i32, i32)) -> i32 {
    let (width, height) = magnitude.dimensions();
    match (x.checked_add_signed(dx), y.checked_add_signed(dy)) {
        (Some(nx), Some(ny)) if nx < width && ny < height => magnitude.get_pixel(nx, ny).0[0],
        _ => 0,
    }
}

/// Keep pixels stronger than `low` that are local maxima along their
/// gradient direction. Suppressed pixels are 0.
fn non_maximum_suppression(
    magnitude: &Image<Luma<i32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
    low: f32,
) -> Image<Luma<i32>> {
    let (width, height) = magnitude.dimensions();
    let mut out = Image::from_pixel(width, height, Luma([0]));

    for (x, y, pixel) in magnitude.enumerate_pixels() {
        let value = pixel.0[0];
        if f64::from(value) <= f64::from(low) {
            continue;
        }
        let direction = Direction::of(
            i32::from(gx.get_pixel(x, y).0[0]),
            i32::from(gy.get_pixel(x, y).0[0]),
        );
        let [backward, forward] = direction.offsets();
        let backward = magnitude_at(magnitude, x, y, backward);
        let forward = magnitude_at(magnitude, x, y, forward);
        let is_maximum = value > backward
            && (value > forward || (direction.keeps_forward_tie() && value == forward));
        if is_maximum {
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// Offsets of the eight neighbours of a pixel.
const NEIGHBOUR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// In-bounds 8-neighbours of `(x, y)`.
fn neighbours(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    NEIGHBOUR_OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < width && ny < height).then_some((nx, ny))
    })
}

/// Seed edges at candidates above `high`, then grow them through
/// 8-connected candidates. Iterative depth-first fill.
fn hysteresis(candidates: &Image<Luma<i32>>, high: f32) -> GrayImage {
    let (width, height) = candidates.dimensions();
    let mut out = GrayImage::new(width, height);
    let mut stack = Vec::new();

    for (x, y, pixel) in candidates.enumerate_pixels() {
        if f64::from(pixel.0[0]) <= f64::from(high) || out.get_pixel(x, y).0[0] != 0 {
            continue;
        }
        out.put_pixel(x, y, EDGE);
        stack.push((x, y));

        while let Some((cx, cy)) = stack.pop() {
            for (nx, ny) in neighbours(cx, cy, width, height) {
                if candidates.get_pixel(nx, ny).0[0] != 0 && out.get_pixel(nx, ny).0[0] == 0 {
                    out.put_pixel(nx, ny, EDGE);
                    stack.push((nx, ny));
                }
            }
        }
    }
    out
}
