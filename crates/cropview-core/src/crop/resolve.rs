//! Viewport crop rectangle to pixel-space recipe.

use tracing::debug;

use super::{CropRequest, CropResult};
use crate::error::CropError;

/// Resolve `request` into a pixel-space [`CropResult`].
///
/// The working raster may be a downsampled decode of the source. The
/// recipe resizes it back towards source resolution (capped by the max
/// result size), so `left`/`top`/`width`/`height` are expressed in the
/// resized, rotated raster.
///
/// # Errors
///
/// * `CropError::InvalidSource` - zero source or working dimensions
/// * `CropError::DegenerateGeometry` - empty image bounds or crop rectangle
///
/// # Panics
///
/// If the snapshot scale is zero or non-finite. A loaded view never holds
/// such a scale.
pub fn resolve_crop(request: &CropRequest) -> Result<CropResult, CropError> {
    if request.working_width == 0 || request.working_height == 0 {
        return Err(CropError::InvalidSource(format!(
            "working raster is {}x{}",
            request.working_width, request.working_height
        )));
    }
    if request.source_width == 0 || request.source_height == 0 {
        return Err(CropError::InvalidSource(format!(
            "source image is {}x{}",
            request.source_width, request.source_height
        )));
    }

    let crop = request.crop_rect;
    if crop.is_empty() {
        return Err(CropError::DegenerateGeometry(format!(
            "crop rectangle {:?} has no area",
            crop
        )));
    }
    let image_bounds = request.snapshot.corners.bounding_rect();
    if image_bounds.is_empty() {
        return Err(CropError::DegenerateGeometry(
            "image bounds have no area".to_string(),
        ));
    }

    let width_ratio = request.source_width as f64 / request.working_width as f64;
    let height_ratio = request.source_height as f64 / request.working_height as f64;
    let decode_resize_scale = width_ratio.min(height_ratio);

    let mut adjusted_scale = request.snapshot.scale / decode_resize_scale;
    assert!(
        adjusted_scale.is_finite() && adjusted_scale > 0.0,
        "crop resolved against unusable scale {}",
        request.snapshot.scale
    );

    let mut crop_w = crop.width() / adjusted_scale;
    let mut crop_h = crop.height() / adjusted_scale;

    let max_w = request.max_result_width as f64;
    let max_h = request.max_result_height as f64;
    let mut extra_resize_scale = 1.0;
    if max_w > 0.0 && max_h > 0.0 && (crop_w > max_w || crop_h > max_h) {
        extra_resize_scale = (max_w / crop_w).min(max_h / crop_h);
        adjusted_scale /= extra_resize_scale;
        crop_w = crop.width() / adjusted_scale;
        crop_h = crop.height() / adjusted_scale;
    }

    let result = CropResult {
        left: ((crop.left - image_bounds.left) / adjusted_scale).round() as i32,
        top: ((crop.top - image_bounds.top) / adjusted_scale).round() as i32,
        width: (crop_w.round() as u32).max(1),
        height: (crop_h.round() as u32).max(1),
        rotation_degrees: request.snapshot.angle,
        resize_scale: decode_resize_scale * extra_resize_scale,
        decode_resize_scale,
        extra_resize_scale,
    };

    debug!(
        "Resolved crop {}x{} at ({}, {}), rotate {:.2}, resize {:.4}",
        result.width,
        result.height,
        result.left,
        result.top,
        result.rotation_degrees,
        result.resize_scale
    );
    Ok(result)
}
