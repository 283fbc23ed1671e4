//! Cropview Core - crop widget geometry engine
//!
//! This crate tracks how an image is scaled, rotated and translated under a
//! fixed crop viewport, animates it back whenever it stops covering the crop
//! rectangle, and turns the final placement into a pixel-space crop recipe
//! that is executed against the decoded raster.
//!
//! # Modules
//!
//! - [`geometry`] - points, rectangles and image corner quadrilaterals
//! - [`transform`] - clamped transform state and the coverage correction
//! - [`animation`] - easing curves and the externally pumped scheduler
//! - [`crop`] - crop recipe resolution and the crop worker
//! - [`raster`] - resize/rotate/crop/encode/EXIF behind the `RasterOps` trait
//! - [`view`] - the `CropView` facade hosts talk to

pub mod animation;
pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod transform;
pub mod view;

pub use animation::TickStatus;
pub use config::{AllowedGestures, CropConfig, OutputFormat};
pub use crop::{CropHandle, CropOutput, CropPhase, CropResult};
pub use error::CropError;
pub use geometry::{Point, Rect};
pub use raster::{DecodedImage, FilterType, ImageRasterOps, RasterError, RasterOps};
pub use transform::{TransformSnapshot, TransformState};
pub use view::{CropView, ImageSource, Viewport};
