//! Resizing by an arbitrary scale factor.
//!
//! The crop recipe expresses resizing as a single multiplicative factor
//! relative to the working raster. Output dimensions are rounded and never
//! collapse below one pixel.

use super::{DecodedImage, FilterType, RasterError};

/// Resize an image to exact dimensions.
///
/// # Arguments
///
/// * `image` - The source image to resize
/// * `width` - Target width in pixels
/// * `height` - Target height in pixels
/// * `filter` - Interpolation filter to use
///
/// # Errors
///
/// Returns `RasterError::InvalidDimensions` for a zero target size and
/// `RasterError::InvalidPixelData` when the source buffer is malformed.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    image.validate()?;
    let rgb_image = image.to_rgb_image().ok_or(RasterError::InvalidPixelData {
        expected: (image.width as usize) * (image.height as usize) * 3,
        actual: image.pixels.len(),
    })?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Resize an image by a uniform scale factor.
///
/// # Arguments
///
/// * `image` - The source image
/// * `scale` - Multiplier applied to both dimensions (must be finite and > 0)
/// * `filter` - Interpolation filter to use
///
/// # Returns
///
/// A new `DecodedImage` of `round(width * scale) x round(height * scale)`,
/// each side at least one pixel.
pub fn resize_by_scale(
    image: &DecodedImage,
    scale: f64,
    filter: FilterType,
) -> Result<DecodedImage, RasterError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RasterError::InvalidScale(scale));
    }

    let (width, height) = scaled_dimensions(image.width, image.height, scale);
    resize(image, width, height, filter)
}

fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((width as f64) * scale).round().max(1.0) as u32;
    let h = ((height as f64) * scale).round().max(1.0) as u32;
    (w, h)
}
