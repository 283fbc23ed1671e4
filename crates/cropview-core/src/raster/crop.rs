//! Pixel-space cropping.
//!
//! The resolved crop rectangle may reach a pixel or two past the rotated
//! raster because of rounding. The region is clamped to the raster; only a
//! region with no overlap at all is an error.

use tracing::debug;

use super::{DecodedImage, RasterError};

/// Copy the pixel rectangle `(left, top, width, height)` out of `image`.
///
/// # Arguments
///
/// * `image` - Source raster
/// * `left`, `top` - Top-left corner in pixels (may be negative)
/// * `width`, `height` - Requested size in pixels
///
/// # Returns
///
/// A new `DecodedImage` holding the intersection of the region and the raster.
///
/// # Errors
///
/// Returns `RasterError::RegionOutOfBounds` if the region does not overlap
/// the raster, and `RasterError::InvalidDimensions` for a zero-sized region.
pub fn crop_region(
    image: &DecodedImage,
    left: i64,
    top: i64,
    width: u32,
    height: u32,
) -> Result<DecodedImage, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    image.validate()?;

    let out_of_bounds = || RasterError::RegionOutOfBounds {
        left,
        top,
        width,
        height,
        raster_width: image.width,
        raster_height: image.height,
    };

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + width as i64).min(image.width as i64);
    let y1 = (top + height as i64).min(image.height as i64);
    if x1 <= x0 || y1 <= y0 {
        return Err(out_of_bounds());
    }
    if (x1 - x0, y1 - y0) != (width as i64, height as i64) {
        debug!(
            "Crop region {}x{} at ({}, {}) clamped to {}x{} by the {}x{} raster",
            width,
            height,
            left,
            top,
            x1 - x0,
            y1 - y0,
            image.width,
            image.height
        );
    }

    // Fast path: region covers the whole raster
    if x0 == 0 && y0 == 0 && x1 == image.width as i64 && y1 == image.height as i64 {
        return Ok(image.clone());
    }

    let out_width = (x1 - x0) as usize;
    let out_height = (y1 - y0) as usize;
    let src_stride = image.width as usize * 3;
    let mut output = Vec::with_capacity(out_width * out_height * 3);

    // Copy pixel data row by row
    for y in y0 as usize..y1 as usize {
        let start = y * src_stride + x0 as usize * 3;
        output.extend_from_slice(&image.pixels[start..start + out_width * 3]);
    }

    Ok(DecodedImage {
        width: out_width as u32,
        height: out_height as u32,
        pixels: output,
    })
}
