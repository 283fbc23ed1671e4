//! Externally pumped scheduler for auto-fit and zoom animations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::easing::{ease_in_out_cubic, ease_out_cubic};
use crate::geometry::{Point, Rect};
use crate::transform::{compute_correction, is_wrapped, TransformState};

/// Result of a single [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// At least one task is still running; tick again next frame.
    Continue,
    /// No task is active.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    WrapBounds,
    ZoomToPosition,
}

/// Animates the image back over the crop bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WrapBoundsTask {
    pub start_ms: f64,
    pub duration_ms: f64,
    /// Image center when the task started
    pub start_center: Point,
    pub delta_x: f64,
    pub delta_y: f64,
    pub start_scale: f64,
    /// Relative scale change reached at the end of the task
    pub delta_scale: f64,
    pub translate_only: bool,
}

/// Animates the scale towards a target, anchored at a destination point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomToPositionTask {
    pub start_ms: f64,
    pub duration_ms: f64,
    pub start_scale: f64,
    /// Absolute scale change reached at the end of the task
    pub delta_scale: f64,
    pub dest: Point,
}

/// A running animation of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimationTask {
    WrapBounds(WrapBoundsTask),
    ZoomToPosition(ZoomToPositionTask),
}

impl AnimationTask {
    pub fn kind(&self) -> AnimationKind {
        match self {
            AnimationTask::WrapBounds(_) => AnimationKind::WrapBounds,
            AnimationTask::ZoomToPosition(_) => AnimationKind::ZoomToPosition,
        }
    }
}

/// One slot per animation kind, advanced by [`Scheduler::tick`].
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    wrap: Option<WrapBoundsTask>,
    zoom: Option<ZoomToPositionTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start animating `state` back over `crop_rect`.
    ///
    /// Replaces any running wrap task. Returns `false` (and starts nothing)
    /// when the image already covers the crop.
    pub fn start_wrap_bounds(
        &mut self,
        state: &TransformState,
        crop_rect: &Rect,
        duration_ms: f64,
        now_ms: f64,
    ) -> bool {
        if is_wrapped(state.corners(), crop_rect, state.current_angle()) {
            return false;
        }
        let correction = compute_correction(state, crop_rect);
        self.wrap = Some(WrapBoundsTask {
            start_ms: now_ms,
            duration_ms,
            start_center: state.image_center(),
            delta_x: correction.delta_x,
            delta_y: correction.delta_y,
            start_scale: state.current_scale(),
            delta_scale: correction.delta_scale,
            translate_only: correction.translate_only_suffices,
        });
        debug!("Started wrap-bounds animation ({} ms)", duration_ms);
        true
    }

    /// Start zooming to `target_scale` around `dest`.
    ///
    /// The target is clamped to the maximum scale. Replaces any running
    /// zoom task.
    pub fn start_zoom_to_position(
        &mut self,
        state: &TransformState,
        target_scale: f64,
        dest: Point,
        duration_ms: f64,
        now_ms: f64,
    ) {
        let target_scale = target_scale.min(state.max_scale());
        let start_scale = state.current_scale();
        self.zoom = Some(ZoomToPositionTask {
            start_ms: now_ms,
            duration_ms,
            start_scale,
            delta_scale: target_scale - start_scale,
            dest,
        });
        debug!(
            "Started zoom animation {:.4} -> {:.4} ({} ms)",
            start_scale, target_scale, duration_ms
        );
    }

    /// Advance every active task to `now_ms`.
    ///
    /// A finished zoom task hands over to a wrap task with
    /// `wrap_duration_ms`, which is first ticked on the next frame.
    pub fn tick(
        &mut self,
        state: &mut TransformState,
        crop_rect: &Rect,
        wrap_duration_ms: f64,
        now_ms: f64,
    ) -> TickStatus {
        if let Some(task) = self.wrap {
            if !tick_wrap(&task, state, crop_rect, now_ms) {
                self.wrap = None;
                debug!("Wrap-bounds animation finished");
            }
        }

        if let Some(task) = self.zoom {
            if !tick_zoom(&task, state, now_ms) {
                self.zoom = None;
                debug!("Zoom animation finished");
                self.start_wrap_bounds(state, crop_rect, wrap_duration_ms, now_ms);
            }
        }

        if self.is_active() {
            TickStatus::Continue
        } else {
            TickStatus::Done
        }
    }

    /// Drop every pending task. Safe to call at any time.
    pub fn cancel_all(&mut self) {
        self.wrap = None;
        self.zoom = None;
    }

    pub fn is_active(&self) -> bool {
        self.wrap.is_some() || self.zoom.is_some()
    }

    pub fn task(&self, kind: AnimationKind) -> Option<AnimationTask> {
        match kind {
            AnimationKind::WrapBounds => self.wrap.map(AnimationTask::WrapBounds),
            AnimationKind::ZoomToPosition => self.zoom.map(AnimationTask::ZoomToPosition),
        }
    }
}

/// Progress in `[0, 1]` and whether the duration is used up.
fn progress(start_ms: f64, duration_ms: f64, now_ms: f64) -> (f64, bool) {
    if duration_ms <= 0.0 {
        return (1.0, true);
    }
    let elapsed = (now_ms - start_ms).clamp(0.0, duration_ms);
    (elapsed / duration_ms, elapsed >= duration_ms)
}

/// Returns `true` while the task should keep running.
fn tick_wrap(
    task: &WrapBoundsTask,
    state: &mut TransformState,
    crop_rect: &Rect,
    now_ms: f64,
) -> bool {
    let (t, finished) = progress(task.start_ms, task.duration_ms, now_ms);

    let eased = ease_out_cubic(t);
    let center = state.image_center();
    let moved_x = center.x - task.start_center.x;
    let moved_y = center.y - task.start_center.y;
    state.apply_translate(task.delta_x * eased - moved_x, task.delta_y * eased - moved_y);

    if !task.translate_only {
        let target = task.start_scale * (1.0 + task.delta_scale * ease_in_out_cubic(t));
        state.apply_scale(target / state.current_scale(), crop_rect.center());
    }

    !finished && !is_wrapped(state.corners(), crop_rect, state.current_angle())
}

/// Returns `true` while the task should keep running.
fn tick_zoom(task: &ZoomToPositionTask, state: &mut TransformState, now_ms: f64) -> bool {
    let (t, finished) = progress(task.start_ms, task.duration_ms, now_ms);
    let target = task.start_scale + task.delta_scale * ease_in_out_cubic(t);
    state.apply_scale(target / state.current_scale(), task.dest);
    !finished
}
