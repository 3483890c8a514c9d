//! Cubic interpolation resize, used when no super-resolution model runs

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Resize by an integer factor with Catmull-Rom cubic interpolation
pub fn cubic_resize(image: &RgbImage, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    if scale == 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * scale,
        image.height() * scale,
        FilterType::CatmullRom,
    )
}
