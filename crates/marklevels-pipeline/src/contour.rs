//! External contour tracing on a binary mask.
//!
//! Border following (Suzuki-Abe, via `imageproc::contours::find_contours`)
//! yields every border in the mask: outer borders of foreground regions
//! and borders of holes, arranged in a hierarchy. Only the outermost outer
//! borders are kept; anything nested inside a region (holes and regions
//! inside holes) is dropped.
//!
//! Each kept border is compressed with [`approximate_chain`], which keeps
//! only the endpoints of straight horizontal, vertical, and diagonal runs.
//! Collinear points contribute nothing to area or moments, so the
//! compression changes the representation, not the geometry.

use image::GrayImage;
use imageproc::contours::BorderType;
use tracing::debug;

use crate::types::{Contour, PixelPoint};

/// Find the outermost contours of the foreground regions in `mask`.
///
/// Contours are returned in discovery order: the raster order
/// (top-to-bottom, then left-to-right) of the first pixel of each border.
#[must_use = "returns the traced contours"]
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    let traced: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(mask);
    let total = traced.len();

    let external: Vec<Contour> = traced
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(approximate_chain(&c.points)))
        .collect();

    debug!(
        borders = total,
        external = external.len(),
        "contour tracing complete",
    );
    external
}

/// Compress a closed chain of 8-connected points.
///
/// Repeated points (including a closing point equal to the first) are
/// collapsed first. A point is then dropped when the step into it equals
/// the step out of it, so each straight run is reduced to its two
/// endpoints. Chains of two or fewer distinct points are returned as is.
#[must_use]
pub fn approximate_chain(points: &[PixelPoint]) -> Vec<PixelPoint> {
    let mut points = points.to_vec();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let n = points.len();
    if n <= 2 {
        return points;
    }

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            step(prev, cur) != step(cur, next)
        })
        .map(|i| points[i])
        .collect()
}

fn step(from: PixelPoint, to: PixelPoint) -> (i64, i64) {
    (
        i64::from(to.x) - i64::from(from.x),
        i64::from(to.y) - i64::from(from.y),
    )
}
