//! The raster operations seam and its in-process implementation.

use exif::Tag;

use super::{
    copy_exif, crop_region, encode_jpeg, encode_png, resize_by_scale, rotate, DecodedImage,
    FilterType, RasterError,
};
use crate::config::OutputFormat;

/// Pixel work needed to turn a resolved crop recipe into encoded bytes.
///
/// Implementations must be shareable with the crop worker thread.
pub trait RasterOps: Send + Sync {
    /// Resize by a uniform factor.
    fn resize(&self, raster: &DecodedImage, scale: f64) -> Result<DecodedImage, RasterError>;

    /// Rotate clockwise about the center, expanding the canvas to fit.
    fn rotate(&self, raster: &DecodedImage, degrees: f64) -> Result<DecodedImage, RasterError>;

    /// Extract a pixel rectangle.
    fn crop(
        &self,
        raster: &DecodedImage,
        left: i64,
        top: i64,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage, RasterError>;

    /// Encode the raster in the given container format.
    fn encode(
        &self,
        raster: &DecodedImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, RasterError>;

    /// Carry whitelisted metadata from the source bytes into `encoded`.
    fn copy_metadata(
        &self,
        source_bytes: &[u8],
        encoded: Vec<u8>,
        whitelisted_tags: &[Tag],
        final_width: u32,
        final_height: u32,
    ) -> Result<Vec<u8>, RasterError>;
}

/// [`RasterOps`] built on the `image` and `kamadak-exif` crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRasterOps {
    /// Resampling filter for resize and rotation.
    pub filter: FilterType,
}

impl ImageRasterOps {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for ImageRasterOps {
    /// Lanczos3: crop output is a final export.
    fn default() -> Self {
        Self::new(FilterType::Lanczos3)
    }
}

impl RasterOps for ImageRasterOps {
    fn resize(&self, raster: &DecodedImage, scale: f64) -> Result<DecodedImage, RasterError> {
        resize_by_scale(raster, scale, self.filter)
    }

    fn rotate(&self, raster: &DecodedImage, degrees: f64) -> Result<DecodedImage, RasterError> {
        rotate(raster, degrees, self.filter)
    }

    fn crop(
        &self,
        raster: &DecodedImage,
        left: i64,
        top: i64,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage, RasterError> {
        crop_region(raster, left, top, width, height)
    }

    fn encode(
        &self,
        raster: &DecodedImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, RasterError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(&raster.pixels, raster.width, raster.height, quality),
            OutputFormat::Png => encode_png(&raster.pixels, raster.width, raster.height),
        }
    }

    fn copy_metadata(
        &self,
        source_bytes: &[u8],
        encoded: Vec<u8>,
        whitelisted_tags: &[Tag],
        final_width: u32,
        final_height: u32,
    ) -> Result<Vec<u8>, RasterError> {
        copy_exif(
            source_bytes,
            encoded,
            whitelisted_tags,
            final_width,
            final_height,
        )
    }
}
