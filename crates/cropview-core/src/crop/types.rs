//! Crop request, recipe and outcome types.

use serde::{Deserialize, Serialize};

use crate::config::OutputFormat;
use crate::geometry::Rect;
use crate::transform::TransformSnapshot;

/// Everything the resolver needs, copied out of the view at request time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Crop rectangle in viewport space
    pub crop_rect: Rect,
    pub snapshot: TransformSnapshot,
    /// Intrinsic size of the original image
    pub source_width: u32,
    pub source_height: u32,
    /// Size of the raster actually held in memory
    pub working_width: u32,
    pub working_height: u32,
    /// Output caps; both must be non-zero to take effect
    pub max_result_width: u32,
    pub max_result_height: u32,
}

/// Pixel-space crop recipe.
///
/// Apply to the working raster in order: resize by `resize_scale`, rotate
/// by `rotation_degrees` with canvas expansion, then cut
/// `(left, top, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropResult {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation in degrees
    pub rotation_degrees: f64,
    /// `decode_resize_scale * extra_resize_scale`
    pub resize_scale: f64,
    /// Source size over working size
    pub decode_resize_scale: f64,
    /// Downscale forced by the max result size (1.0 when uncapped)
    pub extra_resize_scale: f64,
}

/// Progress of a single crop invocation.
///
/// `Idle -> Resolving -> Dispatched -> Succeeded | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CropPhase {
    #[default]
    Idle = 0,
    Resolving = 1,
    Dispatched = 2,
    Succeeded = 3,
    Failed = 4,
}

impl CropPhase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CropPhase::Resolving,
            2 => CropPhase::Dispatched,
            3 => CropPhase::Succeeded,
            4 => CropPhase::Failed,
            _ => CropPhase::Idle,
        }
    }

    /// Succeeded or Failed.
    pub fn is_terminal(self) -> bool {
        matches!(self, CropPhase::Succeeded | CropPhase::Failed)
    }
}

/// Encoded crop plus the recipe that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOutput {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub result: CropResult,
}
