//! Face descriptor extraction.
//!
//! Crops the located face region, converts it to HSV, and histograms the
//! hue/saturation channels into a 50×60 grid normalized to [0, 1]. Hue and
//! saturation follow the OpenCV 8-bit convention (H in [0, 180), S in
//! [0, 256)) so the bin ranges match the histogram the original pipeline
//! compared against.

use crate::detector::{locate_face, FaceDetector};
use crate::types::{FaceDescriptor, FaceRegion, HUE_BINS, SAT_BINS};
use image::RgbImage;

/// Compute the HSV hue/saturation histogram descriptor for a face region.
///
/// The region must satisfy the [`FaceRegion`] invariant (inside bounds,
/// nonzero area).
pub fn extract_descriptor(image: &RgbImage, region: &FaceRegion) -> FaceDescriptor {
    let mut values = vec![0.0f32; HUE_BINS * SAT_BINS];

    for y in region.y..region.y + region.height {
        for x in region.x..region.x + region.width {
            let [r, g, b] = image.get_pixel(x, y).0;
            let (h, s, _v) = rgb_to_hsv(r, g, b);
            let hue_bin = (h as usize * HUE_BINS / 180).min(HUE_BINS - 1);
            let sat_bin = (s as usize * SAT_BINS / 256).min(SAT_BINS - 1);
            values[FaceDescriptor::bin_index(hue_bin, sat_bin)] += 1.0;
        }
    }

    normalize_min_max(&mut values);
    FaceDescriptor { values }
}

/// Locate the first face in an image and return its descriptor.
///
/// `None` when no face is found, which is a normal outcome, not an error.
pub fn face_encoding(image: &RgbImage, detector: &dyn FaceDetector) -> Option<FaceDescriptor> {
    let region = locate_face(image, detector)?;
    tracing::debug!(
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        "face located"
    );
    Some(extract_descriptor(image, &region))
}

/// Min-max normalize all cells into [0, 1]. A constant histogram maps to
/// all zeros.
fn normalize_min_max(values: &mut [f32]) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }

    let range = max - min;
    if range > 0.0 {
        for v in values.iter_mut() {
            *v = (*v - min) / range;
        }
    } else {
        for v in values.iter_mut() {
            *v = 0.0;
        }
    }
}

/// RGB → HSV in the OpenCV 8-bit convention: H in [0, 180), S and V in
/// [0, 255].
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let h_degrees = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h_degrees = if h_degrees < 0.0 { h_degrees + 360.0 } else { h_degrees };

    let h = ((h_degrees / 2.0).round() as u32 % 180) as u8;
    (h, s.round() as u8, v.round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::test_support::FixedDetector;
    use image::{Rgb, RgbImage};

    fn two_tone_image(a: Rgb<u8>, b: Rgb<u8>) -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| if (x + y) % 2 == 0 { a } else { b })
    }

    fn full_region() -> FaceRegion {
        FaceRegion { x: 0, y: 0, width: 64, height: 64 }
    }

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255)); // red
        assert_eq!(rgb_to_hsv(0, 255, 0), (60, 255, 255)); // green
        assert_eq!(rgb_to_hsv(0, 0, 255), (120, 255, 255)); // blue
        assert_eq!(rgb_to_hsv(255, 255, 255), (0, 0, 255)); // white
        assert_eq!(rgb_to_hsv(0, 0, 0), (0, 0, 0)); // black
        assert_eq!(rgb_to_hsv(128, 128, 128), (0, 0, 128)); // gray
    }

    #[test]
    fn test_descriptor_shape_and_range() {
        let img = two_tone_image(Rgb([200, 30, 60]), Rgb([20, 180, 220]));
        let desc = extract_descriptor(&img, &full_region());
        assert_eq!(desc.values.len(), HUE_BINS * SAT_BINS);
        assert!(desc.values.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(desc.values.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn test_constant_crop_concentrates_in_one_bin() {
        let img = RgbImage::from_pixel(16, 16, Rgb([50, 100, 150]));
        let desc = extract_descriptor(&img, &FaceRegion { x: 0, y: 0, width: 16, height: 16 });
        assert_eq!(desc.values.iter().filter(|&&v| v == 1.0).count(), 1);
        assert_eq!(desc.values.iter().filter(|&&v| v == 0.0).count(), HUE_BINS * SAT_BINS - 1);
    }

    #[test]
    fn test_self_similarity() {
        let img = two_tone_image(Rgb([200, 30, 60]), Rgb([20, 180, 220]));
        let a = extract_descriptor(&img, &full_region());
        let b = extract_descriptor(&img, &full_region());
        assert!(a.correlation(&b) > 0.99);
    }

    #[test]
    fn test_distinct_colors_do_not_match() {
        let a = extract_descriptor(
            &two_tone_image(Rgb([220, 20, 20]), Rgb([180, 60, 20])),
            &full_region(),
        );
        let b = extract_descriptor(
            &two_tone_image(Rgb([20, 20, 220]), Rgb([20, 180, 200])),
            &full_region(),
        );
        assert!(a.correlation(&b) < 0.5);
    }

    #[test]
    fn test_face_encoding_no_face() {
        let img = two_tone_image(Rgb([200, 30, 60]), Rgb([20, 180, 220]));
        assert!(face_encoding(&img, &FixedDetector(vec![])).is_none());
    }

    #[test]
    fn test_face_encoding_uses_first_region() {
        let img = RgbImage::from_fn(64, 64, |x, _| {
            // Left half red, right half blue.
            if x < 32 { Rgb([230, 10, 10]) } else { Rgb([10, 10, 230]) }
        });
        let left = FaceRegion { x: 0, y: 0, width: 16, height: 64 };
        let right = FaceRegion { x: 48, y: 0, width: 16, height: 64 };

        let enc = face_encoding(&img, &FixedDetector(vec![left.clone(), right])).unwrap();
        let expected = extract_descriptor(&img, &left);
        assert!(enc.correlation(&expected) > 0.99);
    }
}
