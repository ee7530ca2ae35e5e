//! veriface-core: identity-proofing verification pipeline.
//!
//! Provides the image-derived checks used by the verification service:
//! sharpness-based liveness scoring, face location via a pluggable detector
//! (SeetaFace backend), HSV histogram face descriptors, and descriptor
//! comparison. Matching is a deliberately coarse color-histogram
//! correlation, not a learned embedding.

pub mod descriptor;
pub mod detector;
pub mod liveness;
pub mod types;
pub mod verdict;

pub use descriptor::{extract_descriptor, face_encoding};
pub use detector::{locate_face, FaceDetector, SeetaFaceDetector};
pub use liveness::{check_liveness, LivenessResult};
pub use types::{FaceDescriptor, FaceRegion};
pub use verdict::{Severity, Verdict};

use std::path::Path;

/// Correlation above which two descriptors count as the same face.
pub const MATCH_THRESHOLD: f32 = 0.5;

/// Compare two face descriptors.
///
/// Either descriptor being absent is a non-match, never an error. Otherwise
/// matches iff the histogram correlation exceeds [`MATCH_THRESHOLD`].
pub fn compare_faces(known: Option<&FaceDescriptor>, probe: Option<&FaceDescriptor>) -> bool {
    match (known, probe) {
        (Some(a), Some(b)) => a.correlation(b) > MATCH_THRESHOLD,
        _ => false,
    }
}

/// Decode an image from disk, resolving any decode failure to `None`.
///
/// Corrupt or unreadable images are a normal degraded outcome for the
/// pipeline (they surface as "could not load" liveness or "no face found"),
/// so no error is propagated.
pub fn load_image(path: &Path) -> Option<image::RgbImage> {
    match image::open(path) {
        Ok(img) => Some(img.to_rgb8()),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "image decode failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_descriptor(hot: &[(usize, f32)]) -> FaceDescriptor {
        let mut values = vec![0.0f32; types::HUE_BINS * types::SAT_BINS];
        for &(idx, v) in hot {
            values[idx] = v;
        }
        FaceDescriptor { values }
    }

    #[test]
    fn test_compare_faces_identical() {
        let d = uniform_descriptor(&[(0, 1.0), (100, 0.5), (2999, 0.25)]);
        assert!(compare_faces(Some(&d), Some(&d)));
    }

    #[test]
    fn test_compare_faces_disjoint_mass() {
        let a = uniform_descriptor(&[(0, 1.0), (1, 1.0)]);
        let b = uniform_descriptor(&[(2000, 1.0), (2001, 1.0)]);
        assert!(!compare_faces(Some(&a), Some(&b)));
    }

    #[test]
    fn test_compare_faces_missing_descriptor() {
        let d = uniform_descriptor(&[(0, 1.0)]);
        assert!(!compare_faces(None, Some(&d)));
        assert!(!compare_faces(Some(&d), None));
        assert!(!compare_faces(None, None));
    }

    #[test]
    fn test_load_image_missing_file() {
        assert!(load_image(Path::new("/nonexistent/veriface-test.jpg")).is_none());
    }
}
