use serde::{Deserialize, Serialize};

/// Hue bins in a face descriptor (hue range [0, 180), OpenCV convention).
pub const HUE_BINS: usize = 50;
/// Saturation bins in a face descriptor (saturation range [0, 256)).
pub const SAT_BINS: usize = 60;

/// Axis-aligned face bounding box within an image.
///
/// Invariant: lies fully inside the source image bounds and has nonzero
/// area. Produced by [`crate::locate_face`], which clamps raw detector
/// output accordingly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compact comparable representation of a face region.
///
/// A 2D histogram over the hue and saturation channels of the face crop
/// ([`HUE_BINS`] × [`SAT_BINS`], stored row-major, hue-major), min-max
/// normalized into [0, 1]. The value/brightness channel is excluded, which
/// makes the descriptor somewhat illumination-invariant. Owned independently
/// of the source image once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDescriptor {
    pub values: Vec<f32>,
}

impl FaceDescriptor {
    /// Flat bin index for a (hue bin, saturation bin) pair.
    pub fn bin_index(hue_bin: usize, sat_bin: usize) -> usize {
        hue_bin * SAT_BINS + sat_bin
    }

    /// Correlation coefficient between two histograms, in [-1, 1].
    ///
    /// Normalized covariance over the flattened bin values (the standard
    /// histogram-correlation formula). Returns 0.0 when either histogram
    /// has zero variance.
    pub fn correlation(&self, other: &FaceDescriptor) -> f32 {
        let n = self.values.len().min(other.values.len());
        if n == 0 {
            return 0.0;
        }

        let mean_a: f32 = self.values[..n].iter().sum::<f32>() / n as f32;
        let mean_b: f32 = other.values[..n].iter().sum::<f32>() / n as f32;

        let mut cov = 0.0f32;
        let mut var_a = 0.0f32;
        let mut var_b = 0.0f32;

        for (a, b) in self.values[..n].iter().zip(other.values[..n].iter()) {
            let da = a - mean_a;
            let db = b - mean_b;
            cov += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        let denom = (var_a * var_b).sqrt();
        if denom > 0.0 {
            cov / denom
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(values: Vec<f32>) -> FaceDescriptor {
        FaceDescriptor { values }
    }

    #[test]
    fn test_correlation_identical() {
        let a = descriptor(vec![0.0, 0.5, 1.0, 0.25]);
        assert!((a.correlation(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_correlation_opposite() {
        let a = descriptor(vec![1.0, 0.0, 1.0, 0.0]);
        let b = descriptor(vec![0.0, 1.0, 0.0, 1.0]);
        assert!((a.correlation(&b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_correlation_zero_variance() {
        let a = descriptor(vec![0.5, 0.5, 0.5]);
        let b = descriptor(vec![0.0, 1.0, 0.5]);
        assert_eq!(a.correlation(&b), 0.0);
        assert_eq!(b.correlation(&a), 0.0);
    }

    #[test]
    fn test_correlation_empty() {
        let a = descriptor(vec![]);
        assert_eq!(a.correlation(&a), 0.0);
    }

    #[test]
    fn test_serde_round_trip_preserves_correlation() {
        let mut values = vec![0.0f32; HUE_BINS * SAT_BINS];
        values[FaceDescriptor::bin_index(10, 20)] = 1.0;
        values[FaceDescriptor::bin_index(49, 59)] = 0.75;
        let original = descriptor(values);

        let json = serde_json::to_string(&original).unwrap();
        let restored: FaceDescriptor = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.values.len(), HUE_BINS * SAT_BINS);
        assert!((original.correlation(&restored) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bin_index_layout() {
        assert_eq!(FaceDescriptor::bin_index(0, 0), 0);
        assert_eq!(FaceDescriptor::bin_index(0, SAT_BINS - 1), SAT_BINS - 1);
        assert_eq!(FaceDescriptor::bin_index(1, 0), SAT_BINS);
        assert_eq!(
            FaceDescriptor::bin_index(HUE_BINS - 1, SAT_BINS - 1),
            HUE_BINS * SAT_BINS - 1
        );
    }
}
