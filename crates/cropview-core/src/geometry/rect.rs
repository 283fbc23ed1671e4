//! Axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use super::{Corners, Point};

/// An axis-aligned rectangle given by its edges.
///
/// A rectangle is empty when `left >= right` or `top >= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from its top-left corner and size.
    pub fn from_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Smallest rectangle containing all `points`.
    ///
    /// Returns an empty default rectangle for an empty slice.
    pub fn bounding(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let mut r = Self::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for p in points {
            r.left = r.left.min(p.x);
            r.top = r.top.min(p.y);
            r.right = r.right.max(p.x);
            r.bottom = r.bottom.max(p.y);
        }
        r
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    /// True if `other` lies entirely inside `self` (edges inclusive).
    ///
    /// An empty rectangle contains nothing.
    pub fn contains(&self, other: &Rect) -> bool {
        !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// The four corners, clockwise from top-left.
    pub fn corners(&self) -> Corners {
        Corners::new([
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ])
    }

    /// Bounding rectangle of this rectangle after rotating it about the origin.
    pub fn rotated_bounds(&self, degrees: f64) -> Rect {
        self.corners().rotate_about(degrees, Point::ORIGIN).bounding_rect()
    }
}
