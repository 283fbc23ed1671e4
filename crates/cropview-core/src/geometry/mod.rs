//! 2D geometry primitives for the crop viewport.
//!
//! The engine never uses a matrix type. An image placement is an explicit
//! quadrilateral of four corner points, and every transform is applied
//! point by point.
//!
//! # Coordinate System
//!
//! - Viewport space, origin top-left, y axis pointing down
//! - Angles are in degrees, positive = clockwise on screen
//! - Corner order is clockwise starting at the top-left corner:
//!
//! ```text
//! 0 ------> 1
//! ^         |
//! |         v
//! 3 <------ 2
//! ```

mod corners;
mod point;
mod rect;

pub use corners::Corners;
pub use point::Point;
pub use rect::Rect;
