//! Polygon area and spatial moments of a contour.
//!
//! A contour is treated as the polygon through its points. For a filled
//! `w × h` block of pixels that polygon runs through the outer pixel
//! centres and encloses `(w - 1) × (h - 1)` square pixels.
//!
//! Area comes from `imageproc::geometry::contour_area`; first moments from
//! the `geo` polygon centroid scaled by the area.

use geo::{Area, Centroid};

use crate::types::{Contour, PixelPoint, Point};

/// Absolute enclosed area of the contour polygon (shoelace formula).
#[must_use]
pub fn contour_area(contour: &Contour) -> f64 {
    imageproc::geometry::contour_area(contour.points())
}

/// Convert a pixel point to a `geo::Coord`.
fn point_to_coord(p: PixelPoint) -> geo::Coord<f64> {
    geo::Coord {
        x: f64::from(p.x),
        y: f64::from(p.y),
    }
}

/// The contour as a `geo` polygon without holes.
fn to_polygon(contour: &Contour) -> geo::Polygon<f64> {
    let exterior: geo::LineString<f64> = contour
        .points()
        .iter()
        .copied()
        .map(point_to_coord)
        .collect();
    geo::Polygon::new(exterior, Vec::new())
}

/// Zeroth and first order spatial moments of a contour polygon.
///
/// Orientation-independent: a clockwise and a counter-clockwise traversal
/// of the same polygon give the same (non-negative) `m00`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    /// Area.
    pub m00: f64,
    /// First moment about the y axis (sum of x over the area).
    pub m10: f64,
    /// First moment about the x axis (sum of y over the area).
    pub m01: f64,
}

impl Moments {
    /// Compute the moments of `contour`.
    ///
    /// A polygon with no area has all moments zero; `geo` would report
    /// the centroid of its outline instead.
    #[must_use]
    pub fn of(contour: &Contour) -> Self {
        let polygon = to_polygon(contour);
        let m00 = polygon.unsigned_area();
        if m00 < f64::EPSILON {
            return Self::default();
        }
        polygon.centroid().map_or_else(Self::default, |c| Self {
            m00,
            m10: c.x() * m00,
            m01: c.y() * m00,
        })
    }

    /// Centre of mass, or `None` when the area moment is zero.
    ///
    /// Contour vertices are integers, so a non-degenerate `m00` is at
    /// least 0.5.
    #[must_use]
    pub fn centroid(&self) -> Option<Point> {
        if self.m00.abs() < f64::EPSILON {
            return None;
        }
        Some(Point::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}
