//! Time-based animation of corrective transforms.
//!
//! # Scheduling Model
//!
//! Nothing here owns a timer or a thread. The host calls
//! [`Scheduler::tick`] once per display frame with a monotonic timestamp in
//! milliseconds; each tick applies the incremental transform for that
//! instant and reports whether another frame is needed.
//!
//! At most one task of each [`AnimationKind`] is active. Starting a task
//! drops the pending one of the same kind.

mod easing;
mod scheduler;

pub use easing::{ease_in_out_cubic, ease_out_cubic};
pub use scheduler::{
    AnimationKind, AnimationTask, Scheduler, TickStatus, WrapBoundsTask, ZoomToPositionTask,
};
