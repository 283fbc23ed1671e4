//! JavaScript facade over the crop view.
//!
//! The host drives the engine from its UI loop: gesture deltas go in as they
//! arrive, `tick(performance.now())` runs once per animation frame while it
//! returns `true`, and `crop()` produces the encoded result synchronously.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const engine = new JsCropEngine({ target_aspect_ratio: 1.0 });
//! engine.set_widget_size(canvas.width, canvas.height);
//! engine.load_image(new JsDecodedImage(w, h, rgb), w, h, fileBytes);
//!
//! // pointerup
//! if (engine.on_gesture_end(performance.now())) requestAnimationFrame(loop);
//!
//! const out = engine.crop();
//! const blob = new Blob([out.bytes()], { type: 'image/jpeg' });
//! ```

use std::sync::Arc;

use cropview_core::{CropConfig, CropError, CropView, ImageRasterOps, ImageSource, TickStatus};
use wasm_bindgen::prelude::*;

use crate::types::{filter_from_u8, JsCropOutput, JsDecodedImage};

fn to_js_error(e: CropError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn config_from_js(config: JsValue) -> Result<CropConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(CropConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid crop config: {}", e)))
}

/// Crop widget engine for JavaScript hosts.
#[wasm_bindgen]
pub struct JsCropEngine {
    view: CropView,
}

#[wasm_bindgen]
impl JsCropEngine {
    /// Create an engine from a (possibly partial) config object.
    ///
    /// Missing fields take their defaults; `undefined` means all defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCropEngine, JsValue> {
        let config = config_from_js(config)?;
        Self::with_config(config).map_err(to_js_error)
    }

    /// Replace the configuration.
    pub fn configure(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config = config_from_js(config)?;
        self.view.configure(config).map_err(to_js_error)
    }

    /// Current configuration as a plain object.
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.view.config())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Resampling filter for crops: 0 = nearest, 1 = bilinear, 2 = lanczos3.
    pub fn set_filter(&mut self, filter: u8) {
        self.view
            .set_raster_ops(Arc::new(ImageRasterOps::new(filter_from_u8(filter))));
    }

    /// Register `callback(aspectRatio)` for crop bounds changes.
    pub fn set_on_crop_bounds_changed(&mut self, callback: js_sys::Function) {
        self.view.set_on_crop_bounds_changed(move |ratio| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_f64(ratio)) {
                web_sys::console::warn_2(&"crop bounds callback threw".into(), &e);
            }
        });
    }

    /// Register `callback(scale, angle)` for scale and rotation readouts.
    pub fn set_on_transform_changed(&mut self, callback: js_sys::Function) {
        self.view.set_on_transform_changed(move |scale, angle| {
            let result = callback.call2(
                &JsValue::NULL,
                &JsValue::from_f64(scale),
                &JsValue::from_f64(angle),
            );
            if let Err(e) = result {
                web_sys::console::warn_2(&"transform callback threw".into(), &e);
            }
        });
    }

    pub fn set_widget_size(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.view
            .set_widget_size(width, height)
            .map_err(to_js_error)
    }

    /// Crop width / height; 0 follows the image.
    pub fn set_target_aspect_ratio(&mut self, ratio: f64) -> Result<(), JsValue> {
        self.view
            .set_target_aspect_ratio(ratio)
            .map_err(to_js_error)
    }

    /// Load the decoded image.
    ///
    /// # Arguments
    ///
    /// * `image` - Working raster (orientation already applied)
    /// * `source_width`, `source_height` - Intrinsic size of the original file
    /// * `original_bytes` - Original file, used for EXIF copy (optional)
    pub fn load_image(
        &mut self,
        image: &JsDecodedImage,
        source_width: u32,
        source_height: u32,
        original_bytes: Option<Vec<u8>>,
    ) -> Result<(), JsValue> {
        self.load(image, source_width, source_height, original_bytes)
            .map_err(to_js_error)
    }

    pub fn release_image(&mut self) {
        self.view.release_image();
    }

    pub fn on_gesture_start(&mut self) {
        self.view.on_gesture_start();
    }

    pub fn on_scale(&mut self, factor: f64, px: f64, py: f64) -> bool {
        self.view.on_scale(factor, px, py)
    }

    pub fn on_rotate(&mut self, delta_degrees: f64, px: f64, py: f64) {
        self.view.on_rotate(delta_degrees, px, py);
    }

    pub fn on_translate(&mut self, dx: f64, dy: f64) {
        self.view.on_translate(dx, dy);
    }

    /// Returns `true` if an animation was started.
    pub fn on_gesture_end(&mut self, now_ms: f64) -> bool {
        self.view.on_gesture_end(now_ms)
    }

    pub fn on_double_tap(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.view.on_double_tap(x, y, now_ms)
    }

    pub fn zoom_in_image(&mut self, scale: f64) -> bool {
        self.view.zoom_in_image(scale)
    }

    pub fn zoom_out_image(&mut self, scale: f64) -> bool {
        self.view.zoom_out_image(scale)
    }

    pub fn post_rotate(&mut self, delta_degrees: f64) {
        self.view.post_rotate(delta_degrees);
    }

    /// Rotate about the crop center and animate back over the crop bounds.
    pub fn rotate_by_angle(&mut self, delta_degrees: f64, now_ms: f64) -> bool {
        self.view.rotate_by_angle(delta_degrees, now_ms)
    }

    pub fn reset_rotation(&mut self, now_ms: f64) -> bool {
        self.view.reset_rotation(now_ms)
    }

    pub fn set_image_to_wrap_crop_bounds(&mut self, animate: bool, now_ms: f64) -> bool {
        self.view.set_image_to_wrap_crop_bounds(animate, now_ms)
    }

    pub fn zoom_to_position(
        &mut self,
        target_scale: f64,
        px: f64,
        py: f64,
        duration_ms: f64,
        now_ms: f64,
    ) {
        self.view
            .zoom_to_position(target_scale, px, py, duration_ms, now_ms);
    }

    /// Advance animations. Returns `true` while another frame is needed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.view.tick(now_ms) == TickStatus::Continue
    }

    pub fn cancel_all(&mut self) {
        self.view.cancel_all();
    }

    pub fn is_image_wrapped(&self) -> bool {
        self.view.is_image_wrapped()
    }

    /// Current scale, or 0 with no image.
    #[wasm_bindgen(getter)]
    pub fn current_scale(&self) -> f64 {
        self.view.state().map_or(0.0, |s| s.current_scale())
    }

    /// Current angle in degrees, in (-180, 180].
    #[wasm_bindgen(getter)]
    pub fn current_angle(&self) -> f64 {
        self.view.state().map_or(0.0, |s| s.current_angle())
    }

    /// `[left, top, right, bottom]` of the crop rectangle.
    pub fn crop_rect(&self) -> Vec<f64> {
        let r = self.view.crop_rect();
        vec![r.left, r.top, r.right, r.bottom]
    }

    /// `[x0, y0, ..., x3, y3]`, clockwise from top-left. Empty with no image.
    pub fn image_corners(&self) -> Vec<f64> {
        self.view
            .state()
            .map(|s| s.corners().to_array().to_vec())
            .unwrap_or_default()
    }

    /// Pixel recipe for the current placement, as a plain object.
    pub fn resolve_crop(&self) -> Result<JsValue, JsValue> {
        let result = self.view.resolve_crop().map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Snap over the crop bounds and produce the encoded crop.
    pub fn crop(&mut self) -> Result<JsCropOutput, JsValue> {
        self.view
            .crop_now()
            .map(JsCropOutput::from)
            .map_err(to_js_error)
    }
}

impl JsCropEngine {
    pub(crate) fn with_config(config: CropConfig) -> Result<Self, CropError> {
        Ok(Self {
            view: CropView::new(config)?,
        })
    }

    fn load(
        &mut self,
        image: &JsDecodedImage,
        source_width: u32,
        source_height: u32,
        original_bytes: Option<Vec<u8>>,
    ) -> Result<(), CropError> {
        let decoded = image.to_decoded();
        decoded.validate()?;
        let mut source =
            ImageSource::new(decoded).with_source_size(source_width, source_height);
        if let Some(bytes) = original_bytes {
            source = source.with_original_bytes(bytes);
        }
        self.view.load_image(source)
    }
}
