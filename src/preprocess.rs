//! Mode-dependent tone and edge adjustments applied before reduction.

use crate::config::Mode;
use image::{imageops, DynamicImage, Rgb, RgbImage};

/// Unsharp-mask settings passed to `image::imageops::unsharpen`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpMask {
    pub sigma: f32,
    pub threshold: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessProfile {
    /// Percent contrast change for `imageops::contrast` (0 = unchanged).
    pub contrast: f32,
    /// Blend factor against a smoothed copy (1.0 = unchanged).
    pub sharpness: f32,
    pub unsharp: Option<UnsharpMask>,
}

impl PreprocessProfile {
    pub const LOGO: Self = Self {
        contrast: 30.0,
        sharpness: 2.0,
        unsharp: Some(UnsharpMask {
            sigma: 2.0,
            threshold: 3,
        }),
    };

    pub const PHOTO: Self = Self {
        contrast: 10.0,
        sharpness: 1.2,
        unsharp: None,
    };

    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Logo => Self::LOGO,
            Mode::Photo => Self::PHOTO,
        }
    }
}

// Same weights as the classic 3x3 "smooth" kernel; filter3x3 normalizes by the sum.
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];

pub fn preprocess(image: &DynamicImage, profile: &PreprocessProfile) -> RgbImage {
    let mut rgb = flatten_to_rgb(image);

    if profile.contrast != 0.0 {
        rgb = imageops::contrast(&rgb, profile.contrast);
    }
    if (profile.sharpness - 1.0).abs() > f32::EPSILON {
        rgb = enhance_sharpness(&rgb, profile.sharpness);
    }
    if let Some(mask) = profile.unsharp {
        rgb = imageops::unsharpen(&rgb, mask.sigma, mask.threshold);
    }

    log::debug!(
        "Preprocessed {}x{} (contrast {}, sharpness {}, unsharp {})",
        rgb.width(),
        rgb.height(),
        profile.contrast,
        profile.sharpness,
        profile.unsharp.is_some()
    );
    rgb
}

/// Drop alpha by compositing onto white.
pub fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * a + 255.0 * (1.0 - a)).round() as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

/// Extrapolate away from (factor > 1) or toward (factor < 1) a smoothed copy.
/// The one-pixel border has no full neighborhood and is left as is.
fn enhance_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let smoothed: RgbImage = imageops::filter3x3(image, &SMOOTH_KERNEL);
    let mut out = image.clone();
    for (x, y, dst) in out.enumerate_pixels_mut() {
        if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
            continue;
        }
        let soft = smoothed.get_pixel(x, y);
        for c in 0..3 {
            let base = soft[c] as f32;
            let value = base + factor * (dst[c] as f32 - base);
            dst[c] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn flattens_transparent_pixels_onto_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let rgb = flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn keeps_dimensions_for_both_profiles() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(17, 9, |x, y| {
            Rgb([(x * 15) as u8, (y * 28) as u8, 128])
        }));
        for mode in [Mode::Logo, Mode::Photo] {
            let out = preprocess(&img, &PreprocessProfile::for_mode(mode));
            assert_eq!(out.dimensions(), (17, 9));
        }
    }

    #[test]
    fn flat_image_stays_flat_under_sharpening() {
        let img = RgbImage::from_pixel(8, 8, Rgb([90, 120, 200]));
        let out = enhance_sharpness(&img, 2.0);
        assert!(out.pixels().all(|p| *p == Rgb([90, 120, 200])));
    }

    #[test]
    fn logo_profile_increases_contrast() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgb([80, 80, 80])
            } else {
                Rgb([180, 180, 180])
            }
        }));
        let out = preprocess(&img, &PreprocessProfile::LOGO);
        assert!(out.get_pixel(1, 8)[0] < 80);
        assert!(out.get_pixel(14, 8)[0] > 180);
    }
}
