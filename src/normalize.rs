//! Image normalization
//!
//! Every filter in the crate works on `RgbImage` (8 bits, 3 channels).
//! Decoded buffers of any other layout pass through [`normalize`] first.

use image::{DynamicImage, RgbImage};

/// Float samples at or below this maximum are treated as `[0, 1]` data
const UNIT_RANGE_MAX: f32 = 1.0;

/// Coerce an arbitrary pixel buffer into the canonical 8-bit RGB layout.
///
/// - 8-bit RGB is returned unchanged.
/// - Grayscale is promoted by replicating the single channel.
/// - 16-bit data is rescaled to 8 bits.
/// - Alpha is dropped.
/// - Floating point data is sampled for its maximum: `[0, 1]` data is
///   scaled by 255, anything larger is taken as already being in `[0, 255]`.
///
/// The operation is idempotent.
pub fn normalize(image: &DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        DynamicImage::ImageRgb32F(buf) => {
            quantize_float(buf.as_raw(), 3, buf.width(), buf.height())
        }
        DynamicImage::ImageRgba32F(buf) => {
            quantize_float(buf.as_raw(), 4, buf.width(), buf.height())
        }
        other => other.to_rgb8(),
    }
}

/// Owned variant of [`normalize`] that avoids a copy for canonical input
pub fn normalize_owned(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => normalize(&other),
    }
}

/// Quantize interleaved float samples (3 or 4 channels) to 8-bit RGB
fn quantize_float(samples: &[f32], channels: usize, width: u32, height: u32) -> RgbImage {
    let max = samples
        .chunks_exact(channels)
        .flat_map(|px| px[..3].iter().copied())
        .filter(|v| v.is_finite())
        .fold(f32::MIN, f32::max);

    let scale = if max <= UNIT_RANGE_MAX { 255.0 } else { 1.0 };

    let data: Vec<u8> = samples
        .chunks_exact(channels)
        .flat_map(|px| px[..3].iter().map(move |&v| quantize(v * scale)))
        .collect();

    // Buffer length is width * height * 3 by construction
    RgbImage::from_raw(width, height, data).unwrap_or_else(|| RgbImage::new(width, height))
}

#[inline]
fn quantize(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.round().clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba};

    fn gradient_rgb(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn assert_idempotent(input: &DynamicImage) {
        let once = normalize(input);
        let twice = normalize(&DynamicImage::ImageRgb8(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rgb8_is_unchanged() {
        let rgb = gradient_rgb(16, 9);
        let out = normalize(&DynamicImage::ImageRgb8(rgb.clone()));
        assert_eq!(out, rgb);
    }

    #[test]
    fn test_gray_is_promoted_to_three_channels() {
        let gray = ImageBuffer::from_fn(4, 4, |x, _| Luma([(x * 60) as u8]));
        let out = normalize(&DynamicImage::ImageLuma8(gray));
        assert_eq!(out.dimensions(), (4, 4));
        let px = out.get_pixel(3, 0);
        assert_eq!(px.0, [180, 180, 180]);
    }

    #[test]
    fn test_sixteen_bit_is_rescaled() {
        let buf: ImageBuffer<Rgb<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(2, 2, Rgb([65535, 0, 32896]));
        let out = normalize(&DynamicImage::ImageRgb16(buf));
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(0, 0).0[1], 0);
        assert!((out.get_pixel(0, 0).0[2] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_unit_range_float_is_scaled() {
        let buf: ImageBuffer<Rgb<f32>, Vec<f32>> =
            ImageBuffer::from_pixel(3, 3, Rgb([1.0, 0.5, 0.0]));
        let out = normalize(&DynamicImage::ImageRgb32F(buf));
        assert_eq!(out.get_pixel(1, 1).0, [255, 128, 0]);
    }

    #[test]
    fn test_byte_range_float_is_not_rescaled() {
        let buf: ImageBuffer<Rgb<f32>, Vec<f32>> =
            ImageBuffer::from_pixel(3, 3, Rgb([200.0, 12.4, 300.0]));
        let out = normalize(&DynamicImage::ImageRgb32F(buf));
        assert_eq!(out.get_pixel(0, 0).0, [200, 12, 255]);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let buf: ImageBuffer<Rgba<f32>, Vec<f32>> =
            ImageBuffer::from_pixel(2, 2, Rgba([0.2, 0.4, 0.6, 0.0]));
        let out = normalize(&DynamicImage::ImageRgba32F(buf));
        assert_eq!(out.get_pixel(0, 0).0, [51, 102, 153]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        assert_idempotent(&DynamicImage::ImageRgb8(gradient_rgb(8, 8)));

        let wide: ImageBuffer<Rgb<u16>, Vec<u16>> =
            ImageBuffer::from_fn(8, 8, |x, y| Rgb([(x * 8000) as u16, (y * 300) as u16, 4000]));
        assert_idempotent(&DynamicImage::ImageRgb16(wide));

        let unit: ImageBuffer<Rgb<f32>, Vec<f32>> =
            ImageBuffer::from_fn(8, 8, |x, y| Rgb([x as f32 / 7.0, y as f32 / 7.0, 0.25]));
        assert_idempotent(&DynamicImage::ImageRgb32F(unit));

        let bytes: ImageBuffer<Rgb<f32>, Vec<f32>> =
            ImageBuffer::from_fn(8, 8, |x, y| Rgb([x as f32 * 30.0, y as f32 * 2.5, 255.0]));
        assert_idempotent(&DynamicImage::ImageRgb32F(bytes));
    }

    #[test]
    fn test_normalize_owned_matches_borrowed() {
        let gray = ImageBuffer::from_fn(5, 3, |x, y| Luma([(x * 10 + y) as u8]));
        let dynamic = DynamicImage::ImageLuma8(gray);
        assert_eq!(normalize(&dynamic), normalize_owned(dynamic.clone()));
    }
}
