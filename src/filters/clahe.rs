//! Contrast-limited adaptive histogram equalization on luma
//!
//! Per-tile histograms are clipped at `clip_limit * tile_area / 256`, the
//! excess is redistributed evenly, and the per-tile lookup tables are
//! bilinearly interpolated between tile centers.

use image::{GrayImage, Luma, RgbImage};

use super::color::YCrCbPlanes;

/// Tile grid used for local contrast
pub const DEFAULT_TILE_GRID: (u32, u32) = (8, 8);

const BINS: usize = 256;

/// Apply CLAHE to the luma channel only, keeping chroma.
///
/// A clip limit of zero or less returns the input unchanged.
pub fn clahe_luma(image: &RgbImage, clip_limit: f64) -> RgbImage {
    if clip_limit <= 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let mut planes = YCrCbPlanes::from_rgb(image);
    let luma = planes.luma_u8();
    let equalized = clahe_gray(&luma, clip_limit, DEFAULT_TILE_GRID);
    planes.set_luma_u8(&equalized);
    planes.to_rgb()
}

/// Apply CLAHE to a grayscale image with the given tile grid
pub fn clahe_gray(image: &GrayImage, clip_limit: f64, grid: (u32, u32)) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || clip_limit <= 0.0 {
        return image.clone();
    }

    let tiles_x = grid.0.max(1) as usize;
    let tiles_y = grid.1.max(1) as usize;
    let tile_w = (width as usize).div_ceil(tiles_x);
    let tile_h = (height as usize).div_ceil(tiles_y);
    let tile_area = tile_w * tile_h;

    let clip = ((clip_limit * tile_area as f64 / BINS as f64) as usize).max(1);
    let lut_scale = 255.0 / tile_area as f32;

    let mut luts = vec![[0u8; BINS]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut hist = [0usize; BINS];
            for py in 0..tile_h {
                let sy = reflect101(ty * tile_h + py, height as usize);
                for px in 0..tile_w {
                    let sx = reflect101(tx * tile_w + px, width as usize);
                    hist[image.get_pixel(sx as u32, sy as u32).0[0] as usize] += 1;
                }
            }

            clip_histogram(&mut hist, clip);

            let lut = &mut luts[ty * tiles_x + tx];
            let mut sum = 0usize;
            for (bin, count) in hist.iter().enumerate() {
                sum += count;
                lut[bin] = (sum as f32 * lut_scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let v = image.get_pixel(x, y).0[0] as usize;

        let txf = x as f32 * inv_tw - 0.5;
        let tx1 = txf.floor() as i64;
        let xa = txf - tx1 as f32;
        let tx1c = tx1.clamp(0, tiles_x as i64 - 1) as usize;
        let tx2c = (tx1 + 1).clamp(0, tiles_x as i64 - 1) as usize;

        let tyf = y as f32 * inv_th - 0.5;
        let ty1 = tyf.floor() as i64;
        let ya = tyf - ty1 as f32;
        let ty1c = ty1.clamp(0, tiles_y as i64 - 1) as usize;
        let ty2c = (ty1 + 1).clamp(0, tiles_y as i64 - 1) as usize;

        let l = |tx: usize, ty: usize| f32::from(luts[ty * tiles_x + tx][v]);
        let top = l(tx1c, ty1c) * (1.0 - xa) + l(tx2c, ty1c) * xa;
        let bottom = l(tx1c, ty2c) * (1.0 - xa) + l(tx2c, ty2c) * xa;
        let value = top * (1.0 - ya) + bottom * ya;

        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Clip a histogram and spread the excess across all bins
fn clip_histogram(hist: &mut [usize; BINS], clip: usize) {
    let mut excess = 0usize;
    for count in hist.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let batch = excess / BINS;
    let residual = excess - batch * BINS;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (BINS / residual).max(1);
        for count in hist.iter_mut().step_by(step).take(residual) {
            *count += 1;
        }
    }
}

/// Mirror an out-of-range index back into `[0, n)` without repeating the edge
fn reflect101(i: usize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * n - 2;
    let i = i % period;
    if i >= n {
        period - i
    } else {
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn low_contrast() -> RgbImage {
        RgbImage::from_fn(256, 256, |x, y| {
            let v = 100 + ((x + y) % 20) as u8;
            Rgb([v, v.saturating_sub(10), v + 5])
        })
    }

    fn luma_range(image: &RgbImage) -> (u8, u8) {
        let luma = YCrCbPlanes::from_rgb(image).luma_u8();
        let min = luma.pixels().map(|p| p.0[0]).min().unwrap_or(0);
        let max = luma.pixels().map(|p| p.0[0]).max().unwrap_or(0);
        (min, max)
    }

    #[test]
    fn test_non_positive_clip_is_noop() {
        let image = low_contrast();
        assert_eq!(clahe_luma(&image, 0.0), image);
        assert_eq!(clahe_luma(&image, -1.0), image);
    }

    #[test]
    fn test_clahe_stretches_low_contrast() {
        let image = low_contrast();
        let out = clahe_luma(&image, 2.0);
        let (in_min, in_max) = luma_range(&image);
        let (out_min, out_max) = luma_range(&out);
        assert!(out_max - out_min > in_max - in_min);
        assert_eq!(out.dimensions(), image.dimensions());
    }

    #[test]
    fn test_clip_histogram_preserves_total() {
        let mut hist = [0usize; BINS];
        hist[10] = 1000;
        hist[200] = 37;
        let total: usize = hist.iter().sum();
        clip_histogram(&mut hist, 40);
        assert_eq!(hist.iter().sum::<usize>(), total);
        assert!(hist[10] <= 40 + 4);
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(0, 5), 0);
        assert_eq!(reflect101(4, 5), 4);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(7, 5), 1);
        assert_eq!(reflect101(3, 1), 0);
    }

    #[test]
    fn test_small_images_are_handled() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 40 + y * 10) as u8]));
        let out = clahe_gray(&gray, 2.0, DEFAULT_TILE_GRID);
        assert_eq!(out.dimensions(), (3, 2));
    }
}
