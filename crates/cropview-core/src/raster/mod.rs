//! Raster operations used to carry out a resolved crop recipe.
//!
//! The crop engine only ever talks to the [`RasterOps`] trait. The pipeline
//! order is fixed:
//!
//! 1. Resize by the composed resize scale
//! 2. Rotate about the center (canvas expanded to fit)
//! 3. Crop the resolved pixel rectangle
//! 4. Encode (JPEG or PNG)
//! 5. Optionally copy whitelisted EXIF tags from the source
//!
//! [`ImageRasterOps`] is the in-process implementation built on the `image`
//! and `kamadak-exif` crates. Hosts with their own pixel pipeline implement
//! the trait instead.

mod crop;
mod encode;
mod metadata;
mod ops;
mod resize;
mod rotation;
mod types;

pub use crop::crop_region;
pub use encode::{encode_jpeg, encode_png};
pub use metadata::{copy_exif, DEFAULT_METADATA_WHITELIST};
pub use ops::{ImageRasterOps, RasterOps};
pub use resize::{resize, resize_by_scale};
pub use rotation::{compute_rotated_bounds, rotate};
pub use types::{DecodedImage, FilterType, RasterError};
