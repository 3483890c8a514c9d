//! Detail enhancement
//!
//! Splits luma into an edge-preserving base layer (domain transform
//! recursive filter) and a detail layer, amplifies the detail, and
//! recombines with the untouched chroma.
//!
//! # Algorithm
//!
//! 1. Luma scaled to `[0, 1]`
//! 2. Base = recursive domain transform filter with `sigma_space`, `sigma_range`
//! 3. Luma = base + (luma - base) * [`DETAIL_GAIN`]

use image::RgbImage;
use rayon::prelude::*;

use super::color::YCrCbPlanes;

/// Detail layer amplification
pub const DETAIL_GAIN: f32 = 3.0;

/// Filtering iterations of the recursive filter
const ITERATIONS: u32 = 3;

/// Enhance fine detail while preserving strong edges
pub fn detail_enhance(image: &RgbImage, sigma_space: f32, sigma_range: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || sigma_space <= 0.0 || sigma_range <= 0.0 {
        return image.clone();
    }

    let mut planes = YCrCbPlanes::from_rgb(image);
    let luma: Vec<f32> = planes.y.iter().map(|v| v / 255.0).collect();
    let base = domain_transform(&luma, width as usize, height as usize, sigma_space, sigma_range);

    for ((dst, &l), &b) in planes.y.iter_mut().zip(&luma).zip(&base) {
        *dst = (b + (l - b) * DETAIL_GAIN) * 255.0;
    }

    planes.to_rgb()
}

/// Recursive edge-preserving filter of a single `[0, 1]` plane
fn domain_transform(
    plane: &[f32],
    w: usize,
    h: usize,
    sigma_space: f32,
    sigma_range: f32,
) -> Vec<f32> {
    let ratio = sigma_space / sigma_range;

    // Domain transform derivatives
    let mut dhdx = vec![1.0f32; w * h];
    let mut dvdy = vec![1.0f32; w * h];
    for y in 0..h {
        for x in 1..w {
            let i = y * w + x;
            dhdx[i] = 1.0 + ratio * (plane[i] - plane[i - 1]).abs();
        }
    }
    for y in 1..h {
        for x in 0..w {
            let i = y * w + x;
            dvdy[i] = 1.0 + ratio * (plane[i] - plane[i - w]).abs();
        }
    }

    let mut out = plane.to_vec();
    let n = ITERATIONS as i32;
    let denom = (4.0f32.powi(n) - 1.0).sqrt();

    for i in 0..n {
        let sigma_i = sigma_space * 3.0f32.sqrt() * 2.0f32.powi(n - (i + 1)) / denom;
        let a = (-(2.0f32.sqrt()) / sigma_i).exp();

        horizontal_pass(&mut out, &dhdx, w, a);
        vertical_pass(&mut out, &dvdy, w, h, a);
    }

    out
}

fn horizontal_pass(data: &mut [f32], dhdx: &[f32], w: usize, a: f32) {
    data.par_chunks_mut(w)
        .zip(dhdx.par_chunks(w))
        .for_each(|(row, d)| {
            for x in 1..w {
                let v = a.powf(d[x]);
                row[x] += v * (row[x - 1] - row[x]);
            }
            for x in (0..w.saturating_sub(1)).rev() {
                let v = a.powf(d[x + 1]);
                row[x] += v * (row[x + 1] - row[x]);
            }
        });
}

fn vertical_pass(data: &mut [f32], dvdy: &[f32], w: usize, h: usize, a: f32) {
    for y in 1..h {
        for x in 0..w {
            let i = y * w + x;
            let v = a.powf(dvdy[i]);
            data[i] += v * (data[i - w] - data[i]);
        }
    }
    for y in (0..h.saturating_sub(1)).rev() {
        for x in 0..w {
            let i = y * w + x;
            let v = a.powf(dvdy[i + w]);
            data[i] += v * (data[i + w] - data[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn luma_std(image: &RgbImage) -> f32 {
        let planes = YCrCbPlanes::from_rgb(image);
        let mean = planes.y.iter().sum::<f32>() / planes.y.len() as f32;
        (planes.y.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / planes.y.len() as f32).sqrt()
    }

    #[test]
    fn test_constant_image_is_unchanged() {
        let image = RgbImage::from_pixel(16, 12, Rgb([90, 90, 90]));
        assert_eq!(detail_enhance(&image, 8.0, 0.08), image);
    }

    #[test]
    fn test_fine_texture_is_amplified() {
        let image = RgbImage::from_fn(32, 32, |x, y| {
            let v = 120 + ((x * 7 + y * 13) % 9) as u8;
            Rgb([v, v, v])
        });
        let out = detail_enhance(&image, 8.0, 0.08);
        assert!(luma_std(&out) > luma_std(&image));
    }

    #[test]
    fn test_dimensions_preserved() {
        let image = RgbImage::from_pixel(7, 3, Rgb([1, 2, 3]));
        assert_eq!(detail_enhance(&image, 7.2, 0.072).dimensions(), (7, 3));
    }

    #[test]
    fn test_domain_transform_smooths_without_edges() {
        let plane: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 0.5 } else { 0.52 }).collect();
        let out = domain_transform(&plane, 8, 8, 8.0, 1.0);
        let spread = out.iter().cloned().fold(f32::MIN, f32::max)
            - out.iter().cloned().fold(f32::MAX, f32::min);
        assert!(spread < 0.02);
    }
}
