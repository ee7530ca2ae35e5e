//! Face location via a pluggable classical detector.
//!
//! The shipped backend is the SeetaFace engine (`rustface`), a multi-scale
//! sliding-window classifier. Any detector of equivalent accuracy can be
//! substituted through the [`FaceDetector`] trait; the "first detected
//! region wins" selection semantics are applied here, not in the backend.

use crate::types::FaceRegion;
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

const MIN_FACE_SIZE: u32 = 20;
const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE_FACTOR: f32 = 0.8;
const SLIDE_WINDOW_STEP: u32 = 4;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} (download seeta_fd_frontal_v1.0.bin and place in models/)")]
    ModelNotFound(String),
    #[error("failed to load detection model: {0}")]
    ModelLoad(String),
}

/// Pluggable face detection backend.
///
/// Detects faces in a row-major grayscale buffer of `width` × `height`
/// bytes, returning regions in the backend's native output order. Regions
/// may exceed the image bounds; callers clamp.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion>;
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// Loads the SeetaFace frontal-face model from disk at construction.
/// Detection instantiates a fresh engine per call since the underlying
/// detector is stateful and not `Sync`; the parsed model is shared.
pub struct SeetaFaceDetector {
    model: rustface::Model,
}

impl std::fmt::Debug for SeetaFaceDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeetaFaceDetector").finish_non_exhaustive()
    }
}

impl SeetaFaceDetector {
    /// Load the SeetaFace model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let file = std::fs::File::open(model_path)
            .map_err(|e| DetectorError::ModelLoad(e.to_string()))?;
        let model = rustface::read_model(std::io::BufReader::new(file))
            .map_err(|e| DetectorError::ModelLoad(e.to_string()))?;

        tracing::info!(path = %model_path.display(), "loaded SeetaFace detection model");

        Ok(Self { model })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                let (x, width) = clamp_origin(bbox.x(), bbox.width());
                let (y, height) = clamp_origin(bbox.y(), bbox.height());
                FaceRegion { x, y, width, height }
            })
            .collect()
    }
}

/// Shift a negative detector origin to 0, trimming the off-image overhang
/// from the extent rather than sliding the region into the image.
fn clamp_origin(origin: i32, extent: u32) -> (u32, u32) {
    if origin < 0 {
        (0, extent.saturating_sub(origin.unsigned_abs()))
    } else {
        (origin as u32, extent)
    }
}

/// Locate the most prominent face in an image.
///
/// Runs the detector over the grayscale image and selects the **first**
/// region in detector output order; no re-ranking is applied. The region is
/// clamped to the image bounds. Zero detections (or a region that clamps to
/// zero area) is a normal outcome, not an error: returns `None`.
pub fn locate_face(image: &RgbImage, detector: &dyn FaceDetector) -> Option<FaceRegion> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let gray = image::imageops::grayscale(image);
    let regions = detector.detect(gray.as_raw(), width, height);

    let first = regions.into_iter().next()?;
    clamp_region(first, width, height)
}

/// Clamp a raw detection into the image bounds, upholding the
/// [`FaceRegion`] invariant. Degenerate results count as no face.
fn clamp_region(region: FaceRegion, width: u32, height: u32) -> Option<FaceRegion> {
    if region.x >= width || region.y >= height {
        return None;
    }
    let w = region.width.min(width - region.x);
    let h = region.height.min(height - region.y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(FaceRegion {
        x: region.x,
        y: region.y,
        width: w,
        height: h,
    })
}
