//! Current scale, angle and corner points of the image.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::CropError;
use crate::geometry::{Corners, Point, Rect};

/// Immutable copy of a [`TransformState`] handed to the crop worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSnapshot {
    pub corners: Corners,
    pub scale: f64,
    /// Rotation in degrees, normalized into (-180, 180]
    pub angle: f64,
}

/// Placement of the image relative to the crop viewport.
///
/// Created once the working raster size is known, and rebuilt when a new
/// image is loaded or the crop bounds change.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    corners: Corners,
    scale: f64,
    angle: f64,
    min_scale: f64,
    max_scale: f64,
}

impl TransformState {
    /// Fit an `intrinsic_width x intrinsic_height` image into `viewport`.
    ///
    /// The minimum scale is the smallest one at which the image still covers
    /// the viewport; the image starts at that scale, centered, unrotated.
    ///
    /// # Errors
    ///
    /// Returns `CropError::UnsupportedScaleRange` if the bounds are not finite
    /// positive numbers (zero-sized image or empty viewport).
    pub fn initialize(
        viewport: &Rect,
        intrinsic_width: f64,
        intrinsic_height: f64,
        max_scale_multiplier: f64,
    ) -> Result<Self, CropError> {
        let (min_scale, max_scale) = scale_bounds(
            viewport,
            intrinsic_width,
            intrinsic_height,
            max_scale_multiplier,
        )?;

        let w = intrinsic_width * min_scale;
        let h = intrinsic_height * min_scale;
        let left = (viewport.width() - w) / 2.0 + viewport.left;
        let top = (viewport.height() - h) / 2.0 + viewport.top;

        debug!(
            "Initialized {}x{} image in {}x{} viewport, scale {:.4}..{:.4}",
            intrinsic_width,
            intrinsic_height,
            viewport.width(),
            viewport.height(),
            min_scale,
            max_scale
        );

        Ok(Self {
            corners: Rect::from_size(left, top, w, h).corners(),
            scale: min_scale,
            angle: 0.0,
            min_scale,
            max_scale,
        })
    }

    /// Recompute the scale bounds for a new viewport, keeping the placement.
    ///
    /// If the current scale falls outside the new bounds it is clamped,
    /// scaling about the viewport center. Coverage is not restored here.
    pub fn rebound(
        &mut self,
        viewport: &Rect,
        intrinsic_width: f64,
        intrinsic_height: f64,
        max_scale_multiplier: f64,
    ) -> Result<(), CropError> {
        let (min_scale, max_scale) = scale_bounds(
            viewport,
            intrinsic_width,
            intrinsic_height,
            max_scale_multiplier,
        )?;
        self.min_scale = min_scale;
        self.max_scale = max_scale;

        let clamped = self.scale.clamp(min_scale, max_scale);
        if clamped != self.scale {
            self.corners = self
                .corners
                .scale_about(clamped / self.scale, viewport.center());
            self.scale = clamped;
        }
        debug!("Scale bounds now {:.4}..{:.4}", min_scale, max_scale);
        Ok(())
    }

    /// Scale about `pivot` if the resulting scale stays within bounds.
    ///
    /// Out-of-range (or non-finite, non-positive) factors leave the state
    /// untouched. Returns whether the scale was applied.
    pub fn apply_scale(&mut self, factor: f64, pivot: Point) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            trace!("Ignoring invalid scale factor {}", factor);
            return false;
        }
        let target = self.scale * factor;
        if target < self.min_scale || target > self.max_scale {
            trace!(
                "Scale {:.4} outside [{:.4}, {:.4}], ignored",
                target,
                self.min_scale,
                self.max_scale
            );
            return false;
        }
        self.corners = self.corners.scale_about(factor, pivot);
        self.scale = target;
        true
    }

    /// Rotate about `pivot`. Rotation is never clamped.
    pub fn apply_rotate(&mut self, delta_degrees: f64, pivot: Point) {
        if delta_degrees == 0.0 || !delta_degrees.is_finite() {
            return;
        }
        self.corners = self.corners.rotate_about(delta_degrees, pivot);
        self.angle = (self.angle + delta_degrees) % 360.0;
    }

    /// Shift the image by `(dx, dy)`.
    pub fn apply_translate(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.corners = self.corners.translate(dx, dy);
    }

    #[inline]
    pub fn current_scale(&self) -> f64 {
        self.scale
    }

    /// Current angle in degrees, normalized into (-180, 180].
    pub fn current_angle(&self) -> f64 {
        let a = self.angle % 360.0;
        if a > 180.0 {
            a - 360.0
        } else if a <= -180.0 {
            a + 360.0
        } else {
            a
        }
    }

    #[inline]
    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    #[inline]
    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    #[inline]
    pub fn corners(&self) -> &Corners {
        &self.corners
    }

    pub fn image_center(&self) -> Point {
        self.corners.center()
    }

    /// Axis-aligned bounding box of the image in viewport space.
    pub fn image_rect(&self) -> Rect {
        self.corners.bounding_rect()
    }

    /// True when the image's bounding box has no area.
    pub fn is_degenerate(&self) -> bool {
        self.image_rect().is_empty()
    }

    pub fn snapshot(&self) -> TransformSnapshot {
        TransformSnapshot {
            corners: self.corners,
            scale: self.scale,
            angle: self.current_angle(),
        }
    }
}

/// `min = max(vw / iw, vh / ih)`, `max = min * multiplier`.
fn scale_bounds(
    viewport: &Rect,
    intrinsic_width: f64,
    intrinsic_height: f64,
    max_scale_multiplier: f64,
) -> Result<(f64, f64), CropError> {
    let width_scale = viewport.width() / intrinsic_width;
    let height_scale = viewport.height() / intrinsic_height;

    let min_scale = width_scale.max(height_scale);
    let max_scale = min_scale * max_scale_multiplier;

    if !(min_scale.is_finite() && max_scale.is_finite())
        || min_scale <= 0.0
        || max_scale < min_scale
    {
        return Err(CropError::UnsupportedScaleRange {
            min: min_scale,
            max: max_scale,
        });
    }
    Ok((min_scale, max_scale))
}


// ============================================================================
// Property-Based Tests
// ============================================================================
