//! Error types for the crop engine.

use thiserror::Error;

use crate::raster::RasterError;

/// Errors surfaced by geometry setup, crop resolution and crop dispatch.
///
/// Geometry errors are detected before any raster work starts. Raster
/// errors are passed through unchanged.
#[derive(Debug, Error)]
pub enum CropError {
    /// The working raster is missing or was already released.
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// The image quadrilateral or the crop rectangle has zero area.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The computed scale bounds are not finite positive numbers.
    #[error("Unsupported scale range: min {min}, max {max}")]
    UnsupportedScaleRange { min: f64, max: f64 },

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The raster collaborator failed.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// The crop worker finished without delivering an outcome.
    #[error("Crop worker ended without a result")]
    WorkerLost,
}
