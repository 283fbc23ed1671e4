//! WASM-compatible wrapper types for image data and crop results.
//!
//! This module provides JavaScript-friendly types that wrap the core cropview
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use cropview_core::{CropOutput, DecodedImage, FilterType};
use wasm_bindgen::prelude::*;

/// A decoded RGB image handed over from JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create a new JsDecodedImage from dimensions and pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsDecodedImage {
    /// Convert to a core DecodedImage, cloning the pixel data.
    pub(crate) fn to_decoded(&self) -> DecodedImage {
        DecodedImage {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }
}

/// Encoded crop plus the recipe that produced it.
#[wasm_bindgen]
pub struct JsCropOutput {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    rotation_degrees: f64,
    resize_scale: f64,
}

#[wasm_bindgen]
impl JsCropOutput {
    /// Encoded file bytes as Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Crop offset in the resized, rotated raster
    #[wasm_bindgen(getter)]
    pub fn left(&self) -> i32 {
        self.left
    }

    #[wasm_bindgen(getter)]
    pub fn top(&self) -> i32 {
        self.top
    }

    #[wasm_bindgen(getter)]
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    #[wasm_bindgen(getter)]
    pub fn resize_scale(&self) -> f64 {
        self.resize_scale
    }
}

impl From<CropOutput> for JsCropOutput {
    fn from(output: CropOutput) -> Self {
        Self {
            width: output.width,
            height: output.height,
            left: output.result.left,
            top: output.result.top,
            rotation_degrees: output.result.rotation_degrees,
            resize_scale: output.result.resize_scale,
            bytes: output.bytes,
        }
    }
}

/// Convert a u8 filter type value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest (fastest, lowest quality)
/// - 1 = Bilinear (good balance of speed and quality)
/// - 2 = Lanczos3 (best quality, slowest)
///
/// Any other value defaults to Lanczos3, the export default.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        1 => FilterType::Bilinear,
        _ => FilterType::Lanczos3,
    }
}
