//! A point in viewport space.

use serde::{Deserialize, Serialize};

/// A 2D point (or vector) in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Shift the point by `(dx, dy)`.
    #[inline]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Rotate the point around `pivot` by `degrees` (clockwise on screen).
    ///
    /// With the y axis pointing down, the usual rotation formula
    /// ```text
    /// x' = px + dx * cos(θ) - dy * sin(θ)
    /// y' = py + dx * sin(θ) + dy * cos(θ)
    /// ```
    /// turns the point clockwise as seen on screen.
    #[inline]
    pub fn rotate_about(self, degrees: f64, pivot: Point) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Self::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
    }

    /// Scale the distance from `pivot` by `factor`.
    #[inline]
    pub fn scale_about(self, factor: f64, pivot: Point) -> Self {
        Self::new(
            pivot.x + (self.x - pivot.x) * factor,
            pivot.y + (self.y - pivot.y) * factor,
        )
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between `self` and `other`.
    #[inline]
    pub fn midpoint(self, other: Point) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}
