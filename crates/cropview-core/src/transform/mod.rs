//! Transform bookkeeping and the auto-fit ("wrap crop bounds") algorithm.
//!
//! # Transform Model
//!
//! The image placement is tracked as a [`Corners`](crate::geometry::Corners)
//! quadrilateral in viewport space plus the scalar scale and angle that
//! produced it. Only scale is bounded; rotation and translation are free and
//! get corrected afterwards by [`compute_correction`].
//!
//! # Coverage
//!
//! The image "wraps" the crop bounds when, after un-rotating both the image
//! and the crop rectangle by the current angle, the image's bounding box
//! contains the crop rectangle's bounding box.

mod state;
mod wrap;

pub use state::{TransformSnapshot, TransformState};
pub use wrap::{compute_correction, image_indents, is_wrapped, Correction, SCALE_SAFETY_FACTOR};
