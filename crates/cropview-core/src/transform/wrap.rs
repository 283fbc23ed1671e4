//! Coverage test and corrective transform.
//!
//! # Algorithm
//!
//! Containment of two rotated rectangles is not a rectangle-vs-rectangle
//! comparison, so both shapes are first un-rotated by the current angle
//! (about the origin). In that frame the image is axis-aligned again and a
//! plain bounding-box containment test decides coverage.
//!
//! The correction is two-phase:
//! 1. Try translation alone: move the image center onto the crop center.
//!    If that restores coverage, the actual move is the minimal one that
//!    makes the nearest image edges flush with the crop edges.
//! 2. Otherwise keep the re-centering move and add the relative scale
//!    needed for the image sides to span the (rotated) crop rectangle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TransformState;
use crate::geometry::{Corners, Point, Rect};

/// Extra head-room on scale corrections so float rounding never leaves a
/// one-pixel gap along an edge.
pub const SCALE_SAFETY_FACTOR: f64 = 1.01;

/// The move needed to make the image cover the crop rectangle again.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Correction {
    pub delta_x: f64,
    pub delta_y: f64,
    /// Relative scale change (`target / current - 1`), 0 when not needed
    pub delta_scale: f64,
    pub translate_only_suffices: bool,
}

impl Correction {
    pub fn is_noop(&self) -> bool {
        self.delta_x == 0.0 && self.delta_y == 0.0 && self.delta_scale == 0.0
    }
}

/// Check whether `corners` (rotated by `angle`) cover `crop_rect`.
pub fn is_wrapped(corners: &Corners, crop_rect: &Rect, angle: f64) -> bool {
    let (image, crop) = unrotated_bounds(corners, crop_rect, angle);
    image.contains(&crop)
}

/// Compute the corrective transform for `state` against `crop_rect`.
///
/// Returns a no-op correction when the image already covers the crop.
pub fn compute_correction(state: &TransformState, crop_rect: &Rect) -> Correction {
    let angle = state.current_angle();
    let corners = state.corners();

    if is_wrapped(corners, crop_rect, angle) {
        return Correction {
            translate_only_suffices: true,
            ..Default::default()
        };
    }

    let image_center = state.image_center();
    let crop_center = crop_rect.center();
    let delta_x = crop_center.x - image_center.x;
    let delta_y = crop_center.y - image_center.y;

    let translated = corners.translate(delta_x, delta_y);
    let correction = if is_wrapped(&translated, crop_rect, angle) {
        let indent = image_indents(corners, crop_rect, angle);
        Correction {
            delta_x: -indent.x,
            delta_y: -indent.y,
            delta_scale: 0.0,
            translate_only_suffices: true,
        }
    } else {
        let rotated_crop = crop_rect.rotated_bounds(angle);
        let (side_w, side_h) = corners.sides();
        let needed = (rotated_crop.width() / side_w).max(rotated_crop.height() / side_h);
        Correction {
            delta_x,
            delta_y,
            delta_scale: needed * SCALE_SAFETY_FACTOR - 1.0,
            translate_only_suffices: false,
        }
    };

    debug!(
        "Wrap correction: dx {:.2}, dy {:.2}, scale {:+.4}, translate only: {}",
        correction.delta_x,
        correction.delta_y,
        correction.delta_scale,
        correction.translate_only_suffices
    );
    correction
}

/// Summed edge gaps between the image and the crop, in viewport space.
///
/// In the un-rotated frame, a left/top gap is the positive distance the
/// image edge sits inside the crop edge, a right/bottom gap the negative
/// one. Left+right and top+bottom are summed and the vector is rotated
/// back by `angle`. Moving the image by the negated vector closes the gaps.
pub fn image_indents(corners: &Corners, crop_rect: &Rect, angle: f64) -> Point {
    let (image, crop) = unrotated_bounds(corners, crop_rect, angle);

    let delta_left = image.left - crop.left;
    let delta_top = image.top - crop.top;
    let delta_right = image.right - crop.right;
    let delta_bottom = image.bottom - crop.bottom;

    let indent_left = delta_left.max(0.0);
    let indent_top = delta_top.max(0.0);
    let indent_right = delta_right.min(0.0);
    let indent_bottom = delta_bottom.min(0.0);

    Point::new(indent_left + indent_right, indent_top + indent_bottom)
        .rotate_about(angle, Point::ORIGIN)
}

fn unrotated_bounds(corners: &Corners, crop_rect: &Rect, angle: f64) -> (Rect, Rect) {
    let image = corners.rotate_about(-angle, Point::ORIGIN).bounding_rect();
    let crop = crop_rect
        .corners()
        .rotate_about(-angle, Point::ORIGIN)
        .bounding_rect();
    (image, crop)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
