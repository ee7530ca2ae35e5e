//! Sharpness-based liveness scoring (blur detection).
//!
//! A live capture under normal focus carries high-frequency detail; a photo
//! of a screen or a printed photo is comparatively blurred or flat. The
//! score is the variance of the discrete Laplacian over the grayscale image.

use image::RgbImage;

/// Fixed liveness threshold on the Laplacian variance. Not configurable,
/// not calibrated per-camera.
const LIVENESS_THRESHOLD: f64 = 100.0;

/// Outcome of a liveness check.
#[derive(Debug, Clone)]
pub struct LivenessResult {
    pub is_live: bool,
    /// Laplacian variance; >= 0, unbounded above.
    pub score: f64,
    pub message: String,
}

impl LivenessResult {
    /// Result for an image that could not be decoded.
    pub fn unreadable() -> Self {
        Self {
            is_live: false,
            score: 0.0,
            message: "Could not load image.".to_string(),
        }
    }
}

/// Score the liveness of an image.
///
/// Pure function of image content: grayscale conversion, 4-neighbor
/// Laplacian, population variance of the responses. `is_live` iff the
/// variance exceeds the fixed threshold of 100.0.
pub fn check_liveness(image: &RgbImage) -> LivenessResult {
    let gray = image::imageops::grayscale(image);
    let score = laplacian_variance(&gray);

    let is_live = score > LIVENESS_THRESHOLD;
    let message = if is_live {
        format!("Liveness Confirmed (Score: {score:.2})")
    } else {
        format!("Liveness Failed (Score: {score:.2})")
    };

    tracing::debug!(score, is_live, "liveness check");

    LivenessResult {
        is_live,
        score,
        message,
    }
}

/// Variance of the 4-neighbor discrete Laplacian over a grayscale image,
/// with replicated borders.
fn laplacian_variance(gray: &image::GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let px = |x: i64, y: i64| -> f64 {
        let cx = x.clamp(0, width as i64 - 1) as u32;
        let cy = y.clamp(0, height as i64 - 1) as u32;
        gray.get_pixel(cx, cy).0[0] as f64
    };

    let count = (width as u64 * height as u64) as f64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let response = px(x - 1, y) + px(x + 1, y) + px(x, y - 1) + px(x, y + 1)
                - 4.0 * px(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    sum_sq / count - mean * mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// High-contrast checkerboard: strong edge response at every pixel.
    fn sharp_image() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    /// Smooth horizontal gradient: near-zero second derivative everywhere.
    fn smooth_image() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, _| {
            let v = (x * 4) as u8;
            Rgb([v, v, v])
        })
    }

    fn flat_image() -> RgbImage {
        RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]))
    }

    #[test]
    fn test_sharp_image_is_live() {
        let result = check_liveness(&sharp_image());
        assert!(result.is_live);
        assert!(result.score > LIVENESS_THRESHOLD);
        assert!(result.message.starts_with("Liveness Confirmed (Score: "));
    }

    #[test]
    fn test_flat_image_is_not_live() {
        let result = check_liveness(&flat_image());
        assert!(!result.is_live);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.message, "Liveness Failed (Score: 0.00)");
    }

    #[test]
    fn test_blur_lowers_score() {
        let sharp = check_liveness(&sharp_image());
        let smooth = check_liveness(&smooth_image());
        assert!(sharp.score > smooth.score);
        assert!(sharp.is_live);
        assert!(!smooth.is_live);
    }

    #[test]
    fn test_message_formats_score_to_two_decimals() {
        let result = check_liveness(&sharp_image());
        let expected = format!("Liveness Confirmed (Score: {:.2})", result.score);
        assert_eq!(result.message, expected);
    }

    #[test]
    fn test_unreadable_result() {
        let result = LivenessResult::unreadable();
        assert!(!result.is_live);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.message, "Could not load image.");
    }

    #[test]
    fn test_single_pixel_image() {
        let img = RgbImage::from_pixel(1, 1, Rgb([200, 10, 40]));
        let result = check_liveness(&img);
        assert!(!result.is_live);
        assert_eq!(result.score, 0.0);
    }
}
