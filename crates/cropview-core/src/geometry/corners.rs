//! The transformed image quadrilateral.

use serde::{Deserialize, Serialize};

use super::{Point, Rect};

/// Four corner points, clockwise from the top-left corner.
///
/// Corners start out as an axis-aligned rectangle and stay a rectangle
/// (possibly rotated) under any sequence of uniform scale, rotation and
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Corners(pub [Point; 4]);

impl Corners {
    pub const fn new(points: [Point; 4]) -> Self {
        Self(points)
    }

    #[inline]
    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    /// Flatten to `[x0, y0, x1, y1, x2, y2, x3, y3]`.
    pub fn to_array(&self) -> [f64; 8] {
        let p = &self.0;
        [
            p[0].x, p[0].y, p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y,
        ]
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self(self.0.map(|p| p.translate(dx, dy)))
    }

    pub fn rotate_about(&self, degrees: f64, pivot: Point) -> Self {
        Self(self.0.map(|p| p.rotate_about(degrees, pivot)))
    }

    pub fn scale_about(&self, factor: f64, pivot: Point) -> Self {
        Self(self.0.map(|p| p.scale_about(factor, pivot)))
    }

    /// Center of the quadrilateral (midpoint of the 0-2 diagonal).
    pub fn center(&self) -> Point {
        self.0[0].midpoint(self.0[2])
    }

    /// Lengths of the top side (0-1) and the right side (1-2).
    pub fn sides(&self) -> (f64, f64) {
        (self.0[0].distance(self.0[1]), self.0[1].distance(self.0[2]))
    }

    /// Smallest axis-aligned rectangle containing the corners.
    ///
    /// Coordinates are rounded to a tenth of a pixel first so that float
    /// noise from repeated rotations does not break edge-to-edge containment.
    pub fn bounding_rect(&self) -> Rect {
        Rect::bounding(&self.0.map(|p| Point::new(round_tenth(p.x), round_tenth(p.y))))
    }

    /// Largest per-coordinate distance to `other`.
    pub fn max_deviation(&self, other: &Corners) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a.x - b.x).abs().max((a.y - b.y).abs()))
            .fold(0.0, f64::max)
    }
}

#[inline]
fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
