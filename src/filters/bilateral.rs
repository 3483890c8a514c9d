//! Edge-preserving bilateral smoothing
//!
//! Color distance is the sum of absolute channel differences; the spatial
//! support is a disc of radius `diameter / 2`. Rows are filtered in
//! parallel.

use image::RgbImage;
use rayon::prelude::*;

/// Largest possible summed channel difference
const MAX_COLOR_DISTANCE: usize = 255 * 3;

/// Bilateral filter an RGB image.
///
/// A `diameter` of 0 derives the radius from `sigma_space` (1.5 sigma).
/// Non-positive sigmas fall back to 1.0.
pub fn bilateral_filter(
    image: &RgbImage,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let sigma_color = if sigma_color > 0.0 { sigma_color } else { 1.0 };
    let sigma_space = if sigma_space > 0.0 { sigma_space } else { 1.0 };
    let radius = if diameter == 0 {
        (sigma_space * 1.5).round() as i32
    } else {
        (diameter / 2) as i32
    }
    .max(1);

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let color_weights: Vec<f32> = (0..=MAX_COLOR_DISTANCE)
        .map(|d| ((d * d) as f64 * color_coeff).exp() as f32)
        .collect();

    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let mut offsets: Vec<(i32, i32, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = f64::from(dx * dx + dy * dy);
            if r2.sqrt() > f64::from(radius) {
                continue;
            }
            offsets.push((dx, dy, (r2 * space_coeff).exp() as f32));
        }
    }

    let w = width as i32;
    let h = height as i32;
    let src = image.as_raw();
    let row_len = width as usize * 3;
    let mut out = vec![0u8; src.len()];

    out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let y = y as i32;
        for x in 0..w {
            let ci = (y as usize * width as usize + x as usize) * 3;
            let center = [src[ci], src[ci + 1], src[ci + 2]];

            let mut sum = [0.0f32; 3];
            let mut wsum = 0.0f32;
            for &(dx, dy, ws) in &offsets {
                let sx = (x + dx).clamp(0, w - 1) as usize;
                let sy = (y + dy).clamp(0, h - 1) as usize;
                let si = (sy * width as usize + sx) * 3;
                let px = [src[si], src[si + 1], src[si + 2]];

                let dist = (0..3)
                    .map(|c| (i32::from(px[c]) - i32::from(center[c])).unsigned_abs() as usize)
                    .sum::<usize>();
                let weight = ws * color_weights[dist];

                for c in 0..3 {
                    sum[c] += f32::from(px[c]) * weight;
                }
                wsum += weight;
            }

            let oi = x as usize * 3;
            for c in 0..3 {
                row[oi + c] = (sum[c] / wsum).round().clamp(0.0, 255.0) as u8;
            }
        }
    });

    RgbImage::from_raw(width, height, out).unwrap_or_else(|| image.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_constant_image_is_unchanged() {
        let image = RgbImage::from_pixel(20, 15, Rgb([80, 120, 160]));
        assert_eq!(bilateral_filter(&image, 7, 55.0, 55.0), image);
    }

    #[test]
    fn test_strong_edge_is_preserved() {
        let image = RgbImage::from_fn(30, 10, |x, _| {
            if x < 15 {
                Rgb([10, 10, 10])
            } else {
                Rgb([240, 240, 240])
            }
        });
        let out = bilateral_filter(&image, 7, 30.0, 30.0);
        assert!(out.get_pixel(14, 5).0[0] < 30);
        assert!(out.get_pixel(15, 5).0[0] > 220);
    }

    #[test]
    fn test_small_noise_is_smoothed() {
        let image = RgbImage::from_fn(21, 21, |x, y| {
            let v = if (x + y) % 2 == 0 { 120 } else { 130 };
            Rgb([v, v, v])
        });
        let out = bilateral_filter(&image, 7, 55.0, 55.0);
        let center = out.get_pixel(10, 10).0[0];
        assert!((122..=128).contains(&center), "center = {}", center);
    }

    #[test]
    fn test_dimensions_preserved() {
        let image = RgbImage::new(9, 4);
        assert_eq!(bilateral_filter(&image, 0, 40.0, 2.0).dimensions(), (9, 4));
    }
}
