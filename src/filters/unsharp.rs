//! Unsharp mask sharpening
//!
//! `result = original * (1 + amount) - blurred * amount`, which is the same as
//! `original + amount * (original - blurred)`.

use image::{Rgb32FImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// Sigma for face-crop restoration
pub const FACE_UNSHARP_SIGMA: f32 = 1.0;

/// Sigma for whole-frame restoration
pub const FRAME_UNSHARP_SIGMA: f32 = 0.9;

/// Sigma for the global finishing pass
pub const FINAL_UNSHARP_SIGMA: f32 = 0.8;

/// Sharpen an RGB image. An amount of zero or less returns the input unchanged.
pub fn unsharp_mask(image: &RgbImage, sigma: f32, amount: f32) -> RgbImage {
    if amount <= 0.0 || sigma <= 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    // Blur in float so the mask keeps sub-level precision
    let planes: Rgb32FImage = Rgb32FImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgb(image.get_pixel(x, y).0.map(f32::from))
    });
    let blurred = gaussian_blur_f32(&planes, sigma);
    let mut out = image.clone();

    for (pixel, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for (value, &b) in pixel.0.iter_mut().zip(soft.0.iter()) {
            let sharpened = f32::from(*value) * (1.0 + amount) - b * amount;
            *value = sharpened.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}
