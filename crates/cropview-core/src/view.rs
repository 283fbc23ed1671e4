//! Host-facing crop view.
//!
//! [`CropView`] owns the viewport, the transform state, the animation
//! scheduler and the loaded image. Hosts feed it gesture deltas and frame
//! timestamps from the UI thread and ask it for crops.
//!
//! # Lifecycle
//!
//! 1. `set_widget_size` and (optionally) `set_target_aspect_ratio` lay out
//!    the crop rectangle.
//! 2. `load_image` fits the image over the crop rectangle.
//! 3. Gestures move the image; `on_gesture_end` starts the auto-fit
//!    animation, which advances with every `tick(now_ms)`.
//! 4. `request_crop` snaps the image back over the crop bounds and hands a
//!    snapshot to a worker thread.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::animation::{Scheduler, TickStatus};
use crate::config::{CropConfig, SOURCE_IMAGE_ASPECT_RATIO};
use crate::crop::{
    execute_crop, resolve_crop, spawn_crop, CropHandle, CropJob, CropOutput, CropRequest,
    CropResult,
};
use crate::error::CropError;
use crate::geometry::{Point, Rect};
use crate::raster::{DecodedImage, ImageRasterOps, RasterOps, DEFAULT_METADATA_WHITELIST};
use crate::transform::{compute_correction, is_wrapped, TransformSnapshot, TransformState};

/// The crop window inside the widget.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    widget_width: u32,
    widget_height: u32,
    aspect_ratio: f64,
    crop_rect: Rect,
}

impl Viewport {
    /// Largest rectangle of `aspect_ratio` centered in the widget.
    ///
    /// Sizes and offsets are truncated to whole pixels.
    pub fn layout(widget_width: u32, widget_height: u32, aspect_ratio: f64) -> Rect {
        let height = (widget_width as f64 / aspect_ratio) as u32;
        if height > widget_height {
            let width = (widget_height as f64 * aspect_ratio) as u32;
            let half_diff = (widget_width - width) / 2;
            Rect::from_size(
                half_diff as f64,
                0.0,
                width as f64,
                widget_height as f64,
            )
        } else {
            let half_diff = (widget_height - height) / 2;
            Rect::from_size(0.0, half_diff as f64, widget_width as f64, height as f64)
        }
    }

    pub fn widget_size(&self) -> (u32, u32) {
        (self.widget_width, self.widget_height)
    }

    /// Effective aspect ratio of the crop rectangle (never the 0 sentinel).
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn crop_rect(&self) -> Rect {
        self.crop_rect
    }

    /// A crop rectangle has been laid out.
    pub fn is_laid_out(&self) -> bool {
        !self.crop_rect.is_empty()
    }
}

/// A decoded image ready for cropping.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Raster held in memory, orientation already applied. `None` once
    /// released.
    pub working: Option<Arc<DecodedImage>>,
    /// Intrinsic size of the original file
    pub source_width: u32,
    pub source_height: u32,
    /// Original encoded file, used as the EXIF source
    pub original_bytes: Option<Arc<[u8]>>,
}

impl ImageSource {
    /// Source whose working raster is the full-resolution image.
    pub fn new(working: DecodedImage) -> Self {
        let (source_width, source_height) = (working.width, working.height);
        Self {
            working: Some(Arc::new(working)),
            source_width,
            source_height,
            original_bytes: None,
        }
    }

    /// Record the original size when `working` was decoded downsampled.
    pub fn with_source_size(mut self, width: u32, height: u32) -> Self {
        self.source_width = width;
        self.source_height = height;
        self
    }

    pub fn with_original_bytes(mut self, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.original_bytes = Some(bytes.into());
        self
    }

    fn working_size(&self) -> Option<(u32, u32)> {
        self.working
            .as_ref()
            .filter(|raster| !raster.is_empty())
            .map(|raster| (raster.width, raster.height))
    }
}

type BoundsCallback = Box<dyn FnMut(f64)>;
type TransformCallback = Box<dyn FnMut(f64, f64)>;

/// Crop widget engine: viewport, transform, animations and crop dispatch.
pub struct CropView {
    config: CropConfig,
    viewport: Viewport,
    image: Option<ImageSource>,
    state: Option<TransformState>,
    scheduler: Scheduler,
    ops: Arc<dyn RasterOps>,
    on_crop_bounds_changed: Option<BoundsCallback>,
    on_transform_changed: Option<TransformCallback>,
}

impl CropView {
    /// Create a view with the in-process raster backend.
    ///
    /// # Errors
    ///
    /// Returns `CropError::InvalidConfig` if `config` does not validate.
    pub fn new(config: CropConfig) -> Result<Self, CropError> {
        config.validate()?;
        Ok(Self {
            config,
            viewport: Viewport::default(),
            image: None,
            state: None,
            scheduler: Scheduler::new(),
            ops: Arc::new(ImageRasterOps::default()),
            on_crop_bounds_changed: None,
            on_transform_changed: None,
        })
    }

    /// Replace the raster backend used by crops.
    pub fn with_raster_ops(mut self, ops: Arc<dyn RasterOps>) -> Self {
        self.set_raster_ops(ops);
        self
    }

    pub fn set_raster_ops(&mut self, ops: Arc<dyn RasterOps>) {
        self.ops = ops;
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Apply a new configuration, re-laying out the crop bounds if needed.
    ///
    /// On error the previous configuration and layout stay in effect.
    pub fn configure(&mut self, config: CropConfig) -> Result<(), CropError> {
        config.validate()?;
        let ratio_changed = config.target_aspect_ratio != self.config.target_aspect_ratio;
        let bounds_changed = config.max_scale_multiplier != self.config.max_scale_multiplier;
        if !(ratio_changed || bounds_changed) {
            self.config = config;
            return Ok(());
        }
        self.commit_layout(config)?;
        if ratio_changed {
            self.notify_bounds_changed();
        }
        Ok(())
    }

    /// Called with the effective aspect ratio whenever it is reconfigured.
    pub fn set_on_crop_bounds_changed(&mut self, callback: impl FnMut(f64) + 'static) {
        self.on_crop_bounds_changed = Some(Box::new(callback));
    }

    /// Called with `(scale, angle)` after the scale or rotation changes.
    pub fn set_on_transform_changed(&mut self, callback: impl FnMut(f64, f64) + 'static) {
        self.on_transform_changed = Some(Box::new(callback));
    }

    pub fn set_widget_size(&mut self, width: u32, height: u32) -> Result<(), CropError> {
        self.viewport.widget_width = width;
        self.viewport.widget_height = height;
        self.relayout()
    }

    /// Set the crop aspect ratio; [`SOURCE_IMAGE_ASPECT_RATIO`] follows the image.
    pub fn set_target_aspect_ratio(&mut self, ratio: f64) -> Result<(), CropError> {
        if !(ratio.is_finite() && ratio >= 0.0) {
            return Err(CropError::InvalidConfig(format!(
                "target_aspect_ratio must be 0 or positive, got {}",
                ratio
            )));
        }
        let mut config = self.config.clone();
        config.target_aspect_ratio = ratio;
        self.commit_layout(config)?;
        self.notify_bounds_changed();
        Ok(())
    }

    /// Load a new image, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `CropError::InvalidSource` if the working raster is missing or
    /// empty, or the source size is zero.
    pub fn load_image(&mut self, source: ImageSource) -> Result<(), CropError> {
        let (width, height) = source.working_size().ok_or_else(|| {
            CropError::InvalidSource("image has no working raster".to_string())
        })?;
        if source.source_width == 0 || source.source_height == 0 {
            return Err(CropError::InvalidSource(format!(
                "source size {}x{}",
                source.source_width, source.source_height
            )));
        }

        self.scheduler.cancel_all();
        self.state = None;
        self.image = Some(source);
        debug!("Loaded {}x{} working raster", width, height);

        self.relayout()?;
        if self.config.target_aspect_ratio == SOURCE_IMAGE_ASPECT_RATIO {
            self.notify_bounds_changed();
        }
        Ok(())
    }

    /// Drop the working raster. Geometry stays, crops fail until reload.
    pub fn release_image(&mut self) {
        self.scheduler.cancel_all();
        if let Some(image) = self.image.as_mut() {
            image.working = None;
            debug!("Released working raster");
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn crop_rect(&self) -> Rect {
        self.viewport.crop_rect
    }

    pub fn state(&self) -> Option<&TransformState> {
        self.state.as_ref()
    }

    pub fn snapshot(&self) -> Option<TransformSnapshot> {
        self.state.as_ref().map(TransformState::snapshot)
    }

    pub fn is_animating(&self) -> bool {
        self.scheduler.is_active()
    }

    /// The image covers the crop rectangle. False when nothing is loaded.
    pub fn is_image_wrapped(&self) -> bool {
        self.state.as_ref().is_some_and(|state| {
            is_wrapped(
                state.corners(),
                &self.viewport.crop_rect,
                state.current_angle(),
            )
        })
    }

    // ------------------------------------------------------------------
    // Gesture input
    // ------------------------------------------------------------------

    /// A touch sequence began: running animations yield to the finger.
    pub fn on_gesture_start(&mut self) {
        self.scheduler.cancel_all();
    }

    /// Pinch by `factor` about `(px, py)`. Returns whether it applied.
    pub fn on_scale(&mut self, factor: f64, px: f64, py: f64) -> bool {
        if !self.config.gestures.scale {
            trace!("Scale gesture disabled");
            return false;
        }
        let applied = self
            .state
            .as_mut()
            .is_some_and(|state| state.apply_scale(factor, Point::new(px, py)));
        if applied {
            self.notify_transform_changed();
        }
        applied
    }

    pub fn on_rotate(&mut self, delta_degrees: f64, px: f64, py: f64) {
        if !self.config.gestures.rotate {
            trace!("Rotate gesture disabled");
            return;
        }
        if let Some(state) = self.state.as_mut() {
            state.apply_rotate(delta_degrees, Point::new(px, py));
            self.notify_transform_changed();
        }
    }

    pub fn on_translate(&mut self, dx: f64, dy: f64) {
        if let Some(state) = self.state.as_mut() {
            state.apply_translate(dx, dy);
        }
    }

    /// Touch sequence ended. Starts the auto-fit animation if needed.
    pub fn on_gesture_end(&mut self, now_ms: f64) -> bool {
        self.set_image_to_wrap_crop_bounds(true, now_ms)
    }

    /// Zoom one step towards the maximum scale around `(x, y)`.
    pub fn on_double_tap(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        if !self.config.gestures.scale {
            return false;
        }
        let Some(target) = self.double_tap_target_scale() else {
            return false;
        };
        self.zoom_to_position(target, x, y, self.config.double_tap_duration_ms, now_ms);
        true
    }

    /// `current * (max / min)^(1 / steps)`
    pub fn double_tap_target_scale(&self) -> Option<f64> {
        let state = self.state.as_ref()?;
        let steps = self.config.double_tap_scale_steps as f64;
        Some(
            state.current_scale()
                * (state.max_scale() / state.min_scale()).powf(1.0 / steps),
        )
    }

    // ------------------------------------------------------------------
    // Programmatic transforms
    // ------------------------------------------------------------------

    /// Zoom to `scale` about the crop center, if it does not exceed the max.
    pub fn zoom_in_image(&mut self, scale: f64) -> bool {
        let center = self.viewport.crop_rect.center();
        self.zoom_in_image_at(scale, center.x, center.y)
    }

    pub fn zoom_in_image_at(&mut self, scale: f64, px: f64, py: f64) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if scale > state.max_scale() {
            return false;
        }
        let applied = state.apply_scale(scale / state.current_scale(), Point::new(px, py));
        if applied {
            self.notify_transform_changed();
        }
        applied
    }

    /// Zoom to `scale` about the crop center, if it is not below the min.
    pub fn zoom_out_image(&mut self, scale: f64) -> bool {
        let center = self.viewport.crop_rect.center();
        self.zoom_out_image_at(scale, center.x, center.y)
    }

    pub fn zoom_out_image_at(&mut self, scale: f64, px: f64, py: f64) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if scale < state.min_scale() {
            return false;
        }
        let applied = state.apply_scale(scale / state.current_scale(), Point::new(px, py));
        if applied {
            self.notify_transform_changed();
        }
        applied
    }

    /// Rotate by `delta_degrees` about the crop center.
    pub fn post_rotate(&mut self, delta_degrees: f64) {
        let center = self.viewport.crop_rect.center();
        if let Some(state) = self.state.as_mut() {
            state.apply_rotate(delta_degrees, center);
            self.notify_transform_changed();
        }
    }

    /// Rotate by `delta_degrees` about the crop center, then animate back
    /// over the crop bounds. Returns whether an animation started.
    pub fn rotate_by_angle(&mut self, delta_degrees: f64, now_ms: f64) -> bool {
        self.scheduler.cancel_all();
        self.post_rotate(delta_degrees);
        self.set_image_to_wrap_crop_bounds(true, now_ms)
    }

    /// Undo all rotation, then animate back over the crop bounds.
    pub fn reset_rotation(&mut self, now_ms: f64) -> bool {
        let Some(angle) = self.state.as_ref().map(TransformState::current_angle) else {
            return false;
        };
        self.rotate_by_angle(-angle, now_ms)
    }

    /// Move the image back over the crop bounds.
    ///
    /// With `animate` a wrap-bounds animation is started; otherwise the
    /// translation and (if needed) scale are applied at once. Returns
    /// `false` when the image already covers the crop.
    pub fn set_image_to_wrap_crop_bounds(&mut self, animate: bool, now_ms: f64) -> bool {
        let crop_rect = self.viewport.crop_rect;
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if animate {
            return self.scheduler.start_wrap_bounds(
                state,
                &crop_rect,
                self.config.animation_duration_ms,
                now_ms,
            );
        }

        let correction = compute_correction(state, &crop_rect);
        if correction.is_noop() {
            return false;
        }
        state.apply_translate(correction.delta_x, correction.delta_y);
        if !correction.translate_only_suffices {
            state.apply_scale(1.0 + correction.delta_scale, crop_rect.center());
            self.notify_transform_changed();
        }
        true
    }

    /// Animate the scale to `target_scale` (clamped to the max) around `(px, py)`.
    pub fn zoom_to_position(
        &mut self,
        target_scale: f64,
        px: f64,
        py: f64,
        duration_ms: f64,
        now_ms: f64,
    ) {
        if let Some(state) = self.state.as_ref() {
            self.scheduler.start_zoom_to_position(
                state,
                target_scale,
                Point::new(px, py),
                duration_ms,
                now_ms,
            );
        }
    }

    /// Advance running animations. Call once per frame until `Done`.
    pub fn tick(&mut self, now_ms: f64) -> TickStatus {
        let crop_rect = self.viewport.crop_rect;
        match self.state.as_mut() {
            Some(state) => {
                let before = (state.current_scale(), state.current_angle());
                let status = self.scheduler.tick(
                    state,
                    &crop_rect,
                    self.config.animation_duration_ms,
                    now_ms,
                );
                if (state.current_scale(), state.current_angle()) != before {
                    self.notify_transform_changed();
                }
                status
            }
            None => {
                self.scheduler.cancel_all();
                TickStatus::Done
            }
        }
    }

    pub fn cancel_all(&mut self) {
        self.scheduler.cancel_all();
    }

    // ------------------------------------------------------------------
    // Cropping
    // ------------------------------------------------------------------

    /// Resolver input for the current placement, without snapping.
    pub fn crop_request(&self) -> Result<CropRequest, CropError> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| CropError::InvalidSource("no image loaded".to_string()))?;
        let (working_width, working_height) = image.working_size().ok_or_else(|| {
            CropError::InvalidSource("working raster was released".to_string())
        })?;
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| CropError::DegenerateGeometry("crop bounds not laid out".to_string()))?;

        Ok(CropRequest {
            crop_rect: self.viewport.crop_rect,
            snapshot: state.snapshot(),
            source_width: image.source_width,
            source_height: image.source_height,
            working_width,
            working_height,
            max_result_width: self.config.max_result_width,
            max_result_height: self.config.max_result_height,
        })
    }

    /// Pixel recipe for the current placement.
    pub fn resolve_crop(&self) -> Result<CropResult, CropError> {
        resolve_crop(&self.crop_request()?)
    }

    /// Stop animations, snap over the crop bounds and crop on a worker.
    ///
    /// # Errors
    ///
    /// Geometry and source errors are returned here; raster errors arrive
    /// through the handle.
    pub fn request_crop(&mut self) -> Result<CropHandle, CropError> {
        let job = self.prepare_crop()?;
        spawn_crop(job, Arc::clone(&self.ops))
    }

    /// Same as [`request_crop`](Self::request_crop) but on the calling thread.
    pub fn crop_now(&mut self) -> Result<CropOutput, CropError> {
        let job = self.prepare_crop()?;
        execute_crop(&job, self.ops.as_ref())
    }

    fn prepare_crop(&mut self) -> Result<CropJob, CropError> {
        self.scheduler.cancel_all();
        self.set_image_to_wrap_crop_bounds(false, 0.0);

        let request = self.crop_request()?;
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| CropError::InvalidSource("no image loaded".to_string()))?;
        let raster = image
            .working
            .clone()
            .ok_or_else(|| CropError::InvalidSource("working raster was released".to_string()))?;

        Ok(CropJob {
            request,
            raster,
            source_bytes: image.original_bytes.clone(),
            format: self.config.output_format,
            quality: self.config.output_quality,
            copy_metadata: self.config.copy_metadata,
            metadata_tags: DEFAULT_METADATA_WHITELIST,
        })
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Aspect ratio in effect: the configured one, or the image's own.
    fn effective_aspect_ratio(&self) -> Option<f64> {
        if self.config.target_aspect_ratio != SOURCE_IMAGE_ASPECT_RATIO {
            return Some(self.config.target_aspect_ratio);
        }
        let (width, height) = self.image.as_ref()?.working_size()?;
        Some(width as f64 / height as f64)
    }

    /// Lay out against `config`; the old config and layout survive a failure.
    fn commit_layout(&mut self, config: CropConfig) -> Result<(), CropError> {
        let previous_config = std::mem::replace(&mut self.config, config);
        let previous_viewport = self.viewport;
        let previous_state = self.state.clone();
        if let Err(e) = self.relayout() {
            debug!("Layout rejected, keeping previous configuration: {}", e);
            self.config = previous_config;
            self.viewport = previous_viewport;
            self.state = previous_state;
            return Err(e);
        }
        Ok(())
    }

    fn relayout(&mut self) -> Result<(), CropError> {
        let (widget_width, widget_height) = self.viewport.widget_size();
        if widget_width == 0 || widget_height == 0 {
            return Ok(());
        }
        let Some(ratio) = self.effective_aspect_ratio() else {
            return Ok(());
        };

        self.viewport.aspect_ratio = ratio;
        self.viewport.crop_rect = Viewport::layout(widget_width, widget_height, ratio);
        let crop_rect = self.viewport.crop_rect;
        debug!(
            "Crop bounds {:.0}x{:.0} at ({:.0}, {:.0}), ratio {:.4}",
            crop_rect.width(),
            crop_rect.height(),
            crop_rect.left,
            crop_rect.top,
            ratio
        );

        let Some((width, height)) = self.image.as_ref().and_then(ImageSource::working_size)
        else {
            return Ok(());
        };
        let multiplier = self.config.max_scale_multiplier;
        match self.state.as_mut() {
            Some(state) => {
                self.scheduler.cancel_all();
                state.rebound(&crop_rect, width as f64, height as f64, multiplier)?;
                self.set_image_to_wrap_crop_bounds(false, 0.0);
            }
            None => {
                self.state = Some(TransformState::initialize(
                    &crop_rect,
                    width as f64,
                    height as f64,
                    multiplier,
                )?);
            }
        }
        self.notify_transform_changed();
        Ok(())
    }

    fn notify_transform_changed(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let (scale, angle) = (state.current_scale(), state.current_angle());
        if let Some(callback) = self.on_transform_changed.as_mut() {
            callback(scale, angle);
        }
    }

    fn notify_bounds_changed(&mut self) {
        if !self.viewport.is_laid_out() {
            return;
        }
        let ratio = self.viewport.aspect_ratio;
        if let Some(callback) = self.on_crop_bounds_changed.as_mut() {
            callback(ratio);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::raster::FilterType;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME_MS: f64 = 16.0;

    fn raster(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(width, height, vec![90u8; (width * height * 3) as usize])
    }

    /// 400x300 image in a 100x100 square crop.
    fn loaded_view() -> CropView {
        let mut view = CropView::new(CropConfig::default()).unwrap();
        view.set_widget_size(100, 100).unwrap();
        view.set_target_aspect_ratio(1.0).unwrap();
        view.load_image(ImageSource::new(raster(400, 300))).unwrap();
        view
    }

    fn run_animation(view: &mut CropView, start_ms: f64) -> usize {
        for frame in 1..=200 {
            if view.tick(start_ms + frame as f64 * FRAME_MS) == TickStatus::Done {
                return frame;
            }
        }
        200
    }

    #[test]
    fn test_layout_wide_widget() {
        // 1080 / (4/3) = 810 fits in 1920
        let rect = Viewport::layout(1080, 1920, 4.0 / 3.0);
        assert_eq!(rect, Rect::new(0.0, 555.0, 1080.0, 1365.0));
    }

    #[test]
    fn test_layout_tall_ratio_spans_height() {
        let rect = Viewport::layout(1000, 1000, 0.5);
        assert_eq!(rect, Rect::new(250.0, 0.0, 750.0, 1000.0));
    }

    #[test]
    fn test_layout_truncates() {
        // 100 / 3 = 33.33 -> 33, half diff (100 - 33) / 2 = 33
        let rect = Viewport::layout(100, 100, 3.0);
        assert_eq!(rect, Rect::new(0.0, 33.0, 100.0, 66.0));
    }

    #[test]
    fn test_load_image_fits_crop() {
        let view = loaded_view();
        let state = view.state().unwrap();
        assert!((state.min_scale() - 1.0 / 3.0).abs() < 1e-9);
        assert!(view.is_image_wrapped());
        assert!(!view.is_animating());
    }

    #[test]
    fn test_load_before_layout_initializes_later() {
        let mut view = CropView::new(CropConfig::default()).unwrap();
        view.load_image(ImageSource::new(raster(40, 20))).unwrap();
        assert!(view.state().is_none());

        view.set_widget_size(100, 100).unwrap();
        // Source ratio 2:1 in a square widget
        assert_eq!(view.crop_rect(), Rect::new(0.0, 25.0, 100.0, 75.0));
        assert!(view.state().is_some());
    }

    #[test]
    fn test_load_rejects_missing_raster() {
        let mut view = CropView::new(CropConfig::default()).unwrap();
        let source = ImageSource {
            working: None,
            source_width: 10,
            source_height: 10,
            original_bytes: None,
        };
        assert!(matches!(
            view.load_image(source),
            Err(CropError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CropConfig::default();
        config.animation_duration_ms = 0.0;
        assert!(matches!(
            CropView::new(config),
            Err(CropError::InvalidConfig(_))
        ));

        let mut view = loaded_view();
        assert!(view.set_target_aspect_ratio(-1.0).is_err());
    }

    #[test]
    fn test_bounds_callback_fires_with_ratio() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut view = CropView::new(CropConfig::default()).unwrap();
        view.set_on_crop_bounds_changed(move |ratio| sink.borrow_mut().push(ratio));
        view.set_widget_size(100, 100).unwrap();
        view.load_image(ImageSource::new(raster(400, 300))).unwrap();
        view.set_target_aspect_ratio(1.0).unwrap();

        assert_eq!(*seen.borrow(), vec![4.0 / 3.0, 1.0]);
    }

    #[test]
    fn test_multiplier_change_relayouts_without_bounds_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut view = loaded_view();
        view.set_on_crop_bounds_changed(move |ratio| sink.borrow_mut().push(ratio));

        let mut config = view.config().clone();
        config.max_scale_multiplier = 4.0;
        view.configure(config).unwrap();

        assert!(seen.borrow().is_empty());
        let state = view.state().unwrap();
        assert!((state.max_scale() - state.min_scale() * 4.0).abs() < 1e-12);

        let mut config = view.config().clone();
        config.target_aspect_ratio = 2.0;
        view.configure(config).unwrap();
        assert_eq!(*seen.borrow(), vec![2.0]);
    }

    #[test]
    fn test_rejected_layout_keeps_previous_config() {
        // 50x50 in a 100x100 crop gives min scale 2, so a huge multiplier
        // overflows the max scale.
        let mut view = CropView::new(CropConfig::default()).unwrap();
        view.set_widget_size(100, 100).unwrap();
        view.set_target_aspect_ratio(1.0).unwrap();
        view.load_image(ImageSource::new(raster(50, 50))).unwrap();
        let before = view.state().unwrap().clone();

        let mut config = view.config().clone();
        config.max_scale_multiplier = f64::MAX;
        config.target_aspect_ratio = 2.0;
        assert!(matches!(
            view.configure(config),
            Err(CropError::UnsupportedScaleRange { .. })
        ));

        assert_eq!(view.config().max_scale_multiplier, 10.0);
        assert_eq!(view.config().target_aspect_ratio, 1.0);
        assert_eq!(view.crop_rect(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(view.state().unwrap(), &before);
    }

    #[test]
    fn test_transform_callback_tracks_scale_and_angle() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut view = loaded_view();
        view.set_on_transform_changed(move |scale, angle| sink.borrow_mut().push((scale, angle)));
        let min = view.state().unwrap().min_scale();

        assert!(view.on_scale(1.5, 50.0, 50.0));
        let (scale, angle) = *seen.borrow().last().unwrap();
        assert!((scale - min * 1.5).abs() < 1e-12);
        assert_eq!(angle, 0.0);

        view.on_rotate(10.0, 50.0, 50.0);
        assert!((seen.borrow().last().unwrap().1 - 10.0).abs() < 1e-9);

        // Translation leaves scale and angle alone
        let count = seen.borrow().len();
        view.on_translate(1.0, 0.0);
        assert!(!view.on_scale(1000.0, 50.0, 50.0));
        assert_eq!(seen.borrow().len(), count);

        assert!(view.zoom_in_image(min * 2.0));
        assert!((seen.borrow().last().unwrap().0 - min * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_callback_follows_animation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut view = loaded_view();
        view.set_on_transform_changed(move |scale, angle| sink.borrow_mut().push((scale, angle)));

        view.post_rotate(30.0);
        assert_eq!(seen.borrow().len(), 1);
        assert!(view.on_gesture_end(0.0));
        run_animation(&mut view, 0.0);

        assert!(seen.borrow().len() > 2);
        let final_scale = view.state().unwrap().current_scale();
        assert!((seen.borrow().last().unwrap().0 - final_scale).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_by_angle_animates_back_over_crop() {
        let mut view = loaded_view();
        assert!(view.rotate_by_angle(45.0, 0.0));
        assert!(view.is_animating());
        assert!((view.state().unwrap().current_angle() - 45.0).abs() < 1e-9);

        run_animation(&mut view, 0.0);
        assert!(view.is_image_wrapped());
    }

    #[test]
    fn test_reset_rotation_returns_to_zero() {
        let mut view = loaded_view();
        view.rotate_by_angle(-30.0, 0.0);
        let end = run_animation(&mut view, 0.0) as f64 * FRAME_MS;

        view.reset_rotation(end);
        assert!(view.state().unwrap().current_angle().abs() < 1e-9);
        run_animation(&mut view, end);
        assert!(view.is_image_wrapped());
    }

    #[test]
    fn test_rotation_helpers_without_image() {
        let mut view = CropView::new(CropConfig::default()).unwrap();
        assert!(!view.reset_rotation(0.0));
        assert!(!view.rotate_by_angle(90.0, 0.0));
    }

    #[test]
    fn test_ratio_change_keeps_image_covering() {
        let mut view = loaded_view();
        view.post_rotate(20.0);
        view.set_image_to_wrap_crop_bounds(false, 0.0);

        view.set_target_aspect_ratio(0.5).unwrap();
        assert_eq!(view.crop_rect(), Rect::new(25.0, 0.0, 75.0, 100.0));
        assert!(view.is_image_wrapped());
        assert!((view.state().unwrap().current_angle() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_gesture_end_animates_back() {
        let mut view = loaded_view();
        view.on_gesture_start();
        view.on_translate(0.0, 30.0);
        assert!(!view.is_image_wrapped());

        assert!(view.on_gesture_end(0.0));
        assert!(view.is_animating());
        let frames = run_animation(&mut view, 0.0);
        assert!(frames < 200);
        assert!(view.is_image_wrapped());
    }

    #[test]
    fn test_gesture_start_cancels_animation() {
        let mut view = loaded_view();
        view.on_translate(0.0, 30.0);
        view.on_gesture_end(0.0);
        view.on_gesture_start();
        assert!(!view.is_animating());
        assert_eq!(view.tick(FRAME_MS), TickStatus::Done);
    }

    #[test]
    fn test_immediate_wrap_after_rotation() {
        let mut view = loaded_view();
        view.post_rotate(30.0);
        assert!(!view.is_image_wrapped());

        assert!(view.set_image_to_wrap_crop_bounds(false, 0.0));
        assert!(view.is_image_wrapped());
        assert!(!view.set_image_to_wrap_crop_bounds(false, 0.0));
    }

    #[test]
    fn test_disabled_gestures_are_ignored() {
        let mut config = CropConfig::default();
        config.gestures.scale = false;
        config.gestures.rotate = false;
        let mut view = CropView::new(config).unwrap();
        view.set_widget_size(100, 100).unwrap();
        view.load_image(ImageSource::new(raster(400, 300))).unwrap();

        assert!(!view.on_scale(2.0, 50.0, 50.0));
        view.on_rotate(45.0, 50.0, 50.0);
        assert_eq!(view.state().unwrap().current_angle(), 0.0);
        assert!(!view.on_double_tap(50.0, 50.0, 0.0));

        // Translation stays enabled
        view.on_translate(20.0, 0.0);
        assert!(!view.is_image_wrapped());
    }

    #[test]
    fn test_scale_gesture_clamped() {
        let mut view = loaded_view();
        assert!(view.on_scale(2.0, 50.0, 50.0));
        assert!(!view.on_scale(100.0, 50.0, 50.0));
        assert!(!view.on_scale(0.1, 50.0, 50.0));
    }

    #[test]
    fn test_zoom_helpers_respect_bounds() {
        let mut view = loaded_view();
        let (min, max) = {
            let s = view.state().unwrap();
            (s.min_scale(), s.max_scale())
        };
        assert!(!view.zoom_in_image(max * 1.5));
        assert!(view.zoom_in_image(min * 2.0));
        assert!((view.state().unwrap().current_scale() - min * 2.0).abs() < 1e-12);
        assert!(!view.zoom_out_image(min * 0.5));
        assert!(view.zoom_out_image_at(min * 1.5, 0.0, 0.0));
    }

    #[test]
    fn test_double_tap_zooms_one_step() {
        let mut view = loaded_view();
        let start = view.state().unwrap().current_scale();
        let target = view.double_tap_target_scale().unwrap();
        // (max / min)^(1/5) with max / min = 10
        assert!((target / start - 10f64.powf(0.2)).abs() < 1e-9);

        assert!(view.on_double_tap(50.0, 50.0, 0.0));
        run_animation(&mut view, 0.0);
        assert!((view.state().unwrap().current_scale() - target).abs() < 1e-9);
        assert!(view.is_image_wrapped());
    }

    #[test]
    fn test_tick_without_image_is_done() {
        let mut view = CropView::new(CropConfig::default()).unwrap();
        assert_eq!(view.tick(0.0), TickStatus::Done);
    }

    #[test]
    fn test_resolve_crop_for_current_placement() {
        let view = loaded_view();
        let result = view.resolve_crop().unwrap();
        assert_eq!((result.width, result.height), (300, 300));
        assert_eq!((result.left, result.top), (50, 0));
    }

    #[test]
    fn test_request_crop_snaps_and_delivers() {
        let mut view = loaded_view();
        view.on_translate(0.0, 30.0);
        view.on_gesture_end(0.0);

        let handle = view.request_crop().unwrap();
        assert!(!view.is_animating());
        assert!(view.is_image_wrapped());

        let output = handle.wait().unwrap();
        assert_eq!((output.width, output.height), (300, 300));
        assert_eq!(output.format, OutputFormat::Jpeg);
    }

    #[test]
    fn test_crop_now_with_downsampled_source() {
        let mut view = CropView::new(CropConfig::default()).unwrap();
        view.set_widget_size(100, 100).unwrap();
        view.set_target_aspect_ratio(1.0).unwrap();
        view.load_image(ImageSource::new(raster(200, 150)).with_source_size(400, 300))
            .unwrap();

        let output = view.crop_now().unwrap();
        assert_eq!(output.result.decode_resize_scale, 2.0);
        assert_eq!((output.width, output.height), (300, 300));
    }

    #[test]
    fn test_custom_raster_ops_png_output() {
        let mut config = CropConfig::default();
        config.output_format = OutputFormat::Png;
        let mut view = CropView::new(config)
            .unwrap()
            .with_raster_ops(Arc::new(ImageRasterOps::new(FilterType::Nearest)));
        view.set_widget_size(100, 100).unwrap();
        view.load_image(ImageSource::new(raster(100, 100))).unwrap();
        view.post_rotate(90.0);

        let output = view.crop_now().unwrap();
        assert_eq!(output.format, OutputFormat::Png);
        assert_eq!((output.width, output.height), (100, 100));
        assert_eq!(output.result.rotation_degrees, 90.0);
    }

    #[test]
    fn test_crop_after_release_fails() {
        let mut view = loaded_view();
        view.release_image();
        assert!(matches!(
            view.request_crop(),
            Err(CropError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_crop_without_image_fails() {
        let mut view = CropView::new(CropConfig::default()).unwrap();
        assert!(matches!(view.crop_now(), Err(CropError::InvalidSource(_))));
    }

    #[test]
    fn test_max_result_size_from_config() {
        let mut config = CropConfig::default();
        config.max_result_width = 120;
        config.max_result_height = 120;
        config.target_aspect_ratio = 1.0;
        let mut view = CropView::new(config).unwrap();
        view.set_widget_size(100, 100).unwrap();
        view.load_image(ImageSource::new(raster(400, 300))).unwrap();

        let output = view.crop_now().unwrap();
        assert_eq!((output.width, output.height), (120, 120));
    }
}
