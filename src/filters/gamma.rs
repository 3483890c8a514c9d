//! Power-law gamma correction through a 256-entry lookup table

use image::RgbImage;

/// Gammas this close to 1.0 are treated as identity
const IDENTITY_TOLERANCE: f64 = 1e-6;

/// Build the lookup table `255 * (i / 255)^(1 / gamma)`
pub fn gamma_lut(gamma: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let v = 255.0 * (i as f64 / 255.0).powf(1.0 / gamma);
        *entry = v.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Apply gamma correction; a gamma of 1.0 returns the input unchanged
pub fn gamma_correct(image: &RgbImage, gamma: f64) -> RgbImage {
    if (gamma - 1.0).abs() < IDENTITY_TOLERANCE {
        return image.clone();
    }

    let lut = gamma_lut(gamma);
    let mut out = image.clone();
    for px in out.pixels_mut() {
        for c in px.0.iter_mut() {
            *c = lut[*c as usize];
        }
    }
    out
}
