//! Turning the on-screen crop into pixels.
//!
//! [`resolve_crop`] maps the viewport crop rectangle and a transform
//! snapshot onto a pixel-space recipe against the working raster.
//! [`execute_crop`] runs that recipe through a [`RasterOps`] implementation
//! and [`spawn_crop`] does the same on a worker thread, delivering the
//! outcome through a [`CropHandle`].
//!
//! # Pipeline
//!
//! ```text
//! resolve -> resize (if scale != 1) -> rotate (if angle != 0) -> crop -> encode -> metadata
//! ```
//!
//! [`RasterOps`]: crate::raster::RasterOps

mod resolve;
mod task;
mod types;

pub use resolve::resolve_crop;
pub use task::{execute_crop, spawn_crop, CropHandle, CropJob};
pub use types::{CropOutput, CropPhase, CropRequest, CropResult};
