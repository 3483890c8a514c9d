//! Elliptical feather mask

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::drawing::draw_filled_ellipse_mut;
use imageproc::filter::gaussian_blur_f32;

/// Ellipse horizontal radius as a fraction of the mask width
pub const FEATHER_RADIUS_X: f32 = 0.48;

/// Ellipse vertical radius as a fraction of the mask height
pub const FEATHER_RADIUS_Y: f32 = 0.58;

/// Gaussian sigma of the falloff
pub const FEATHER_SIGMA: f32 = 5.0;

/// Build a soft blend mask: a solid ellipse centered in the region covering
/// 96% of the width and 116% of the height, blurred for a smooth falloff.
pub fn feather_mask(width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    let center = ((width / 2) as i32, (height / 2) as i32);
    let rx = (width as f32 * FEATHER_RADIUS_X) as i32;
    let ry = (height as f32 * FEATHER_RADIUS_Y) as i32;
    draw_filled_ellipse_mut(&mut mask, center, rx, ry, Luma([255u8]));

    let solid: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([f32::from(mask.get_pixel(x, y).0[0])]));
    let soft = gaussian_blur_f32(&solid, FEATHER_SIGMA);

    GrayImage::from_fn(width, height, |x, y| {
        Luma([soft.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
    })
}
