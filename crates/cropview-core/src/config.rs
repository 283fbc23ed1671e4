//! Crop engine configuration.
//!
//! `CropConfig` is a plain serde struct so hosts can pass it as JSON (or a
//! JS object through the WASM bindings). Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Aspect ratio value meaning "use the source image's own ratio".
pub const SOURCE_IMAGE_ASPECT_RATIO: f64 = 0.0;

pub const DEFAULT_MAX_SCALE_MULTIPLIER: f64 = 10.0;
pub const DEFAULT_ANIMATION_DURATION_MS: f64 = 777.0;
pub const DEFAULT_DOUBLE_TAP_DURATION_MS: f64 = 200.0;
pub const DEFAULT_DOUBLE_TAP_SCALE_STEPS: u32 = 5;
pub const DEFAULT_OUTPUT_QUALITY: u8 = 90;

/// Container format for the encoded crop result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

/// Which gesture kinds the view reacts to. Translation is always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowedGestures {
    pub scale: bool,
    pub rotate: bool,
}

impl Default for AllowedGestures {
    fn default() -> Self {
        Self {
            scale: true,
            rotate: true,
        }
    }
}

/// Host-facing configuration of a crop view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// `max_scale = min_scale * max_scale_multiplier`
    pub max_scale_multiplier: f64,
    /// Duration of the auto-fit animation in milliseconds
    pub animation_duration_ms: f64,
    /// Crop width / height, or 0.0 to follow the source image
    pub target_aspect_ratio: f64,
    /// Upper bound on the output width in pixels (0 = unbounded)
    pub max_result_width: u32,
    /// Upper bound on the output height in pixels (0 = unbounded)
    pub max_result_height: u32,
    pub output_format: OutputFormat,
    /// Encoder quality (1-100), JPEG only
    pub output_quality: u8,
    /// Number of double taps needed to go from min to max scale
    pub double_tap_scale_steps: u32,
    pub double_tap_duration_ms: f64,
    pub gestures: AllowedGestures,
    /// Copy whitelisted EXIF tags from the source into the output
    pub copy_metadata: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            max_scale_multiplier: DEFAULT_MAX_SCALE_MULTIPLIER,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            target_aspect_ratio: SOURCE_IMAGE_ASPECT_RATIO,
            max_result_width: 0,
            max_result_height: 0,
            output_format: OutputFormat::default(),
            output_quality: DEFAULT_OUTPUT_QUALITY,
            double_tap_scale_steps: DEFAULT_DOUBLE_TAP_SCALE_STEPS,
            double_tap_duration_ms: DEFAULT_DOUBLE_TAP_DURATION_MS,
            gestures: AllowedGestures::default(),
            copy_metadata: true,
        }
    }
}

impl CropConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), CropError> {
        if !(self.max_scale_multiplier.is_finite() && self.max_scale_multiplier >= 1.0) {
            return Err(CropError::InvalidConfig(format!(
                "max_scale_multiplier must be >= 1, got {}",
                self.max_scale_multiplier
            )));
        }
        if !(self.animation_duration_ms.is_finite() && self.animation_duration_ms > 0.0) {
            return Err(CropError::InvalidConfig(format!(
                "animation_duration_ms must be positive, got {}",
                self.animation_duration_ms
            )));
        }
        if !(self.double_tap_duration_ms.is_finite() && self.double_tap_duration_ms > 0.0) {
            return Err(CropError::InvalidConfig(format!(
                "double_tap_duration_ms must be positive, got {}",
                self.double_tap_duration_ms
            )));
        }
        if !(self.target_aspect_ratio.is_finite() && self.target_aspect_ratio >= 0.0) {
            return Err(CropError::InvalidConfig(format!(
                "target_aspect_ratio must be 0 or positive, got {}",
                self.target_aspect_ratio
            )));
        }
        if self.double_tap_scale_steps == 0 {
            return Err(CropError::InvalidConfig(
                "double_tap_scale_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Both result bounds set, so the output size is capped.
    pub fn has_max_result_size(&self) -> bool {
        self.max_result_width > 0 && self.max_result_height > 0
    }
}
