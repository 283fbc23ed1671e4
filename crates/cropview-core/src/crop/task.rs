//! Running a crop recipe, inline or on a worker thread.
//!
//! The worker owns a copied [`CropJob`]: a transform snapshot plus an `Arc`
//! of the immutable working raster. Its single outcome travels through a
//! bounded(1) channel; progress is published through an atomic phase.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use async_channel::{Receiver, Sender, TryRecvError};
use exif::Tag;
use tracing::{debug, trace, warn};

use super::{resolve_crop, CropOutput, CropPhase, CropRequest};
use crate::config::OutputFormat;
use crate::error::CropError;
use crate::raster::{DecodedImage, RasterOps, DEFAULT_METADATA_WHITELIST};

type CropOutcome = Result<CropOutput, CropError>;

/// Everything a crop needs, detached from the view.
#[derive(Debug, Clone)]
pub struct CropJob {
    pub request: CropRequest,
    pub raster: Arc<DecodedImage>,
    /// Original encoded file, used as the EXIF source
    pub source_bytes: Option<Arc<[u8]>>,
    pub format: OutputFormat,
    pub quality: u8,
    pub copy_metadata: bool,
    pub metadata_tags: &'static [Tag],
}

impl CropJob {
    /// A job with default output settings (JPEG, quality 90, metadata copied).
    pub fn new(request: CropRequest, raster: Arc<DecodedImage>) -> Self {
        Self {
            request,
            raster,
            source_bytes: None,
            format: OutputFormat::default(),
            quality: crate::config::DEFAULT_OUTPUT_QUALITY,
            copy_metadata: true,
            metadata_tags: DEFAULT_METADATA_WHITELIST,
        }
    }
}

/// Run `job` to completion on the calling thread.
///
/// # Errors
///
/// Geometry errors are returned before `ops` is touched; raster errors are
/// wrapped in `CropError::Raster`.
pub fn execute_crop(job: &CropJob, ops: &dyn RasterOps) -> CropOutcome {
    run(job, ops, &AtomicU8::new(CropPhase::Idle as u8))
}

/// Run `job` on a new worker thread.
///
/// # Errors
///
/// Returns `CropError::WorkerLost` if the thread cannot be spawned.
pub fn spawn_crop(job: CropJob, ops: Arc<dyn RasterOps>) -> Result<CropHandle, CropError> {
    let (sender, receiver) = async_channel::bounded(1);
    let phase = Arc::new(AtomicU8::new(CropPhase::Idle as u8));
    let worker_phase = Arc::clone(&phase);

    thread::Builder::new()
        .name("cropview-crop".to_string())
        .spawn(move || worker(job, ops, worker_phase, sender))
        .map_err(|e| {
            warn!("Failed to spawn crop worker: {}", e);
            CropError::WorkerLost
        })?;

    Ok(CropHandle { receiver, phase })
}

fn worker(job: CropJob, ops: Arc<dyn RasterOps>, phase: Arc<AtomicU8>, sender: Sender<CropOutcome>) {
    // A panicking raster collaborator still ends in a terminal phase.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(&job, ops.as_ref(), &phase)))
        .unwrap_or_else(|_| {
            phase.store(CropPhase::Failed as u8, Ordering::Release);
            warn!("Crop worker panicked");
            Err(CropError::WorkerLost)
        });
    if sender.send_blocking(outcome).is_err() {
        trace!("Crop handle dropped before the result arrived");
    }
}

fn run(job: &CropJob, ops: &dyn RasterOps, phase: &AtomicU8) -> CropOutcome {
    phase.store(CropPhase::Resolving as u8, Ordering::Release);
    let outcome = dispatch(job, ops, phase);
    let end = if outcome.is_ok() {
        CropPhase::Succeeded
    } else {
        CropPhase::Failed
    };
    phase.store(end as u8, Ordering::Release);

    if let Err(e) = &outcome {
        warn!("Crop failed: {}", e);
    }
    outcome
}

fn dispatch(job: &CropJob, ops: &dyn RasterOps, phase: &AtomicU8) -> CropOutcome {
    if job.raster.is_empty() {
        return Err(CropError::InvalidSource(
            "working raster is empty".to_string(),
        ));
    }
    let result = resolve_crop(&job.request)?;

    phase.store(CropPhase::Dispatched as u8, Ordering::Release);

    let resized = if result.resize_scale != 1.0 {
        Some(ops.resize(&job.raster, result.resize_scale)?)
    } else {
        None
    };
    let current = resized.as_ref().unwrap_or(job.raster.as_ref());

    let rotated = if result.rotation_degrees != 0.0 {
        Some(ops.rotate(current, result.rotation_degrees)?)
    } else {
        None
    };
    let current = rotated.as_ref().unwrap_or(current);

    let cropped = ops.crop(
        current,
        result.left as i64,
        result.top as i64,
        result.width,
        result.height,
    )?;
    let mut bytes = ops.encode(&cropped, job.format, job.quality)?;

    if job.copy_metadata && job.format == OutputFormat::Jpeg {
        if let Some(source) = &job.source_bytes {
            bytes = ops.copy_metadata(
                source,
                bytes,
                job.metadata_tags,
                cropped.width,
                cropped.height,
            )?;
        }
    }

    debug!(
        "Crop encoded: {}x{}, {} bytes",
        cropped.width,
        cropped.height,
        bytes.len()
    );
    Ok(CropOutput {
        bytes,
        width: cropped.width,
        height: cropped.height,
        format: job.format,
        result,
    })
}

/// Receiving end of a spawned crop.
///
/// Dropping the handle abandons the result; the worker still runs to
/// completion.
#[derive(Debug)]
pub struct CropHandle {
    receiver: Receiver<CropOutcome>,
    phase: Arc<AtomicU8>,
}

impl CropHandle {
    /// Current phase of the worker.
    pub fn phase(&self) -> CropPhase {
        CropPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Take the outcome if it has arrived.
    ///
    /// Returns `None` while the worker is still running. Once taken, later
    /// calls report `CropError::WorkerLost`.
    pub fn try_take(&self) -> Option<CropOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(CropError::WorkerLost)),
        }
    }

    /// Block the calling thread until the outcome arrives.
    pub fn wait(self) -> CropOutcome {
        self.receiver
            .recv_blocking()
            .map_err(|_| CropError::WorkerLost)?
    }

    /// Await the outcome.
    pub async fn recv(self) -> CropOutcome {
        self.receiver
            .recv()
            .await
            .map_err(|_| CropError::WorkerLost)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::raster::{FilterType, ImageRasterOps, RasterError};
    use crate::transform::TransformState;
    use std::sync::atomic::AtomicUsize;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 100.0)
    }

    fn raster(width: u32, height: u32) -> Arc<DecodedImage> {
        Arc::new(DecodedImage::new(
            width,
            height,
            vec![150u8; (width * height * 3) as usize],
        ))
    }

    fn job(width: u32, height: u32) -> CropJob {
        let state =
            TransformState::initialize(&viewport(), width as f64, height as f64, 10.0).unwrap();
        let request = CropRequest {
            crop_rect: viewport(),
            snapshot: state.snapshot(),
            source_width: width,
            source_height: height,
            working_width: width,
            working_height: height,
            max_result_width: 0,
            max_result_height: 0,
        };
        CropJob::new(request, raster(width, height))
    }

    /// Records which operations ran; encode can be told to fail.
    #[derive(Default)]
    struct RecordingOps {
        resizes: AtomicUsize,
        rotates: AtomicUsize,
        fail_encode: bool,
        panic_on_crop: bool,
    }

    impl RasterOps for RecordingOps {
        fn resize(&self, raster: &DecodedImage, scale: f64) -> Result<DecodedImage, RasterError> {
            self.resizes.fetch_add(1, Ordering::SeqCst);
            ImageRasterOps::new(FilterType::Nearest).resize(raster, scale)
        }

        fn rotate(&self, raster: &DecodedImage, degrees: f64) -> Result<DecodedImage, RasterError> {
            self.rotates.fetch_add(1, Ordering::SeqCst);
            ImageRasterOps::new(FilterType::Nearest).rotate(raster, degrees)
        }

        fn crop(
            &self,
            raster: &DecodedImage,
            left: i64,
            top: i64,
            width: u32,
            height: u32,
        ) -> Result<DecodedImage, RasterError> {
            if self.panic_on_crop {
                panic!("crop exploded");
            }
            crate::raster::crop_region(raster, left, top, width, height)
        }

        fn encode(
            &self,
            raster: &DecodedImage,
            format: OutputFormat,
            quality: u8,
        ) -> Result<Vec<u8>, RasterError> {
            if self.fail_encode {
                return Err(RasterError::EncodingFailed("disk full".to_string()));
            }
            ImageRasterOps::default().encode(raster, format, quality)
        }

        fn copy_metadata(
            &self,
            _source_bytes: &[u8],
            encoded: Vec<u8>,
            _whitelisted_tags: &[Tag],
            _final_width: u32,
            _final_height: u32,
        ) -> Result<Vec<u8>, RasterError> {
            Ok(encoded)
        }
    }

    #[test]
    fn test_execute_crop_square_from_landscape() {
        let output = execute_crop(&job(200, 100), &ImageRasterOps::default()).unwrap();
        assert_eq!((output.width, output.height), (100, 100));
        assert_eq!(output.result.left, 50);
        assert_eq!(&output.bytes[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 100));
    }

    #[test]
    fn test_identity_recipe_skips_resize_and_rotate() {
        let ops = RecordingOps::default();
        execute_crop(&job(200, 100), &ops).unwrap();
        assert_eq!(ops.resizes.load(Ordering::SeqCst), 0);
        assert_eq!(ops.rotates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_downsampled_raster_is_resized_first() {
        let mut job = job(200, 100);
        job.request.source_width = 400;
        job.request.source_height = 200;

        let ops = RecordingOps::default();
        let output = execute_crop(&job, &ops).unwrap();
        assert_eq!(ops.resizes.load(Ordering::SeqCst), 1);
        assert_eq!((output.width, output.height), (200, 200));
    }

    #[test]
    fn test_rotated_snapshot_rotates_raster() {
        let mut state = TransformState::initialize(&viewport(), 100.0, 100.0, 10.0).unwrap();
        state.apply_rotate(90.0, viewport().center());
        let mut job = job(100, 100);
        job.request.snapshot = state.snapshot();

        let ops = RecordingOps::default();
        let output = execute_crop(&job, &ops).unwrap();
        assert_eq!(ops.rotates.load(Ordering::SeqCst), 1);
        assert_eq!((output.width, output.height), (100, 100));
    }

    #[test]
    fn test_overhanging_recipe_is_clamped_in_output() {
        // Image shifted right leaves a 10 px gap on the left of the crop
        let mut state = TransformState::initialize(&viewport(), 100.0, 100.0, 10.0).unwrap();
        state.apply_translate(10.0, 0.0);
        let mut job = job(100, 100);
        job.request.snapshot = state.snapshot();

        let output = execute_crop(&job, &ImageRasterOps::default()).unwrap();
        assert_eq!((output.result.left, output.result.width), (-10, 100));
        assert_eq!((output.width, output.height), (90, 100));
    }

    #[test]
    fn test_png_output() {
        let mut job = job(50, 50);
        job.format = OutputFormat::Png;
        let output = execute_crop(&job, &ImageRasterOps::default()).unwrap();
        assert_eq!(output.format, OutputFormat::Png);
        assert_eq!(&output.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_geometry_error_short_circuits() {
        let mut job = job(50, 50);
        job.request.crop_rect = Rect::new(0.0, 0.0, 0.0, 0.0);
        let ops = RecordingOps::default();
        let result = execute_crop(&job, &ops);
        assert!(matches!(result, Err(CropError::DegenerateGeometry(_))));
        assert_eq!(ops.resizes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_raster_is_invalid_source() {
        let mut job = job(50, 50);
        job.raster = Arc::new(DecodedImage::new(0, 0, vec![]));
        assert!(matches!(
            execute_crop(&job, &ImageRasterOps::default()),
            Err(CropError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_spawn_crop_success() {
        let handle = spawn_crop(job(200, 100), Arc::new(ImageRasterOps::default())).unwrap();
        let output = handle.wait().unwrap();
        assert_eq!((output.width, output.height), (100, 100));
    }

    #[test]
    fn test_spawn_crop_phase_reaches_terminal() {
        let handle = spawn_crop(job(60, 60), Arc::new(ImageRasterOps::default())).unwrap();
        let outcome = loop {
            if let Some(outcome) = handle.try_take() {
                break outcome;
            }
            thread::yield_now();
        };
        assert!(outcome.is_ok());
        assert_eq!(handle.phase(), CropPhase::Succeeded);
    }

    #[test]
    fn test_spawn_crop_raster_failure() {
        let ops = Arc::new(RecordingOps {
            fail_encode: true,
            ..Default::default()
        });
        let handle = spawn_crop(job(60, 60), ops).unwrap();
        let phase_probe = Arc::clone(&handle.phase);
        let result = handle.wait();
        assert!(matches!(
            result,
            Err(CropError::Raster(RasterError::EncodingFailed(_)))
        ));
        assert_eq!(
            CropPhase::from_u8(phase_probe.load(Ordering::Acquire)),
            CropPhase::Failed
        );
    }

    #[test]
    fn test_worker_panic_reports_lost() {
        let ops = Arc::new(RecordingOps {
            panic_on_crop: true,
            ..Default::default()
        });
        let handle = spawn_crop(job(60, 60), ops).unwrap();
        let phase = Arc::clone(&handle.phase);
        assert!(matches!(handle.wait(), Err(CropError::WorkerLost)));
        assert_eq!(
            CropPhase::from_u8(phase.load(Ordering::Acquire)),
            CropPhase::Failed
        );
    }

    #[test]
    fn test_worker_panic_phase_is_terminal_while_polling() {
        let ops = Arc::new(RecordingOps {
            panic_on_crop: true,
            ..Default::default()
        });
        let handle = spawn_crop(job(60, 60), ops).unwrap();
        while !handle.phase().is_terminal() {
            thread::yield_now();
        }
        assert_eq!(handle.phase(), CropPhase::Failed);
        let outcome = loop {
            if let Some(outcome) = handle.try_take() {
                break outcome;
            }
            thread::yield_now();
        };
        assert!(matches!(outcome, Err(CropError::WorkerLost)));
    }
}
