//! Luma/chroma (YCrCb) conversion
//!
//! Uses the BT.601 weights with chroma offset by 128, matching the usual
//! 8-bit YCrCb definition.

use image::{GrayImage, Luma, Rgb, RgbImage};

const KR: f32 = 0.299;
const KG: f32 = 0.587;
const KB: f32 = 0.114;
const CR_SCALE: f32 = 0.713;
const CB_SCALE: f32 = 0.564;
const CHROMA_OFFSET: f32 = 128.0;

/// Float luma/chroma planes of an RGB image
#[derive(Debug, Clone)]
pub struct YCrCbPlanes {
    pub width: u32,
    pub height: u32,
    /// Luma in `[0, 255]`
    pub y: Vec<f32>,
    pub cr: Vec<f32>,
    pub cb: Vec<f32>,
}

impl YCrCbPlanes {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let n = (width * height) as usize;
        let mut y = Vec::with_capacity(n);
        let mut cr = Vec::with_capacity(n);
        let mut cb = Vec::with_capacity(n);

        for px in image.pixels() {
            let [r, g, b] = px.0.map(f32::from);
            let luma = KR * r + KG * g + KB * b;
            y.push(luma);
            cr.push((r - luma) * CR_SCALE + CHROMA_OFFSET);
            cb.push((b - luma) * CB_SCALE + CHROMA_OFFSET);
        }

        Self {
            width,
            height,
            y,
            cr,
            cb,
        }
    }

    /// Luma rounded to 8 bits
    pub fn luma_u8(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let v = self.y[(y * self.width + x) as usize];
            Luma([v.round().clamp(0.0, 255.0) as u8])
        })
    }

    /// Replace luma with an 8-bit plane of the same size
    pub fn set_luma_u8(&mut self, luma: &GrayImage) {
        for (dst, src) in self.y.iter_mut().zip(luma.pixels()) {
            *dst = f32::from(src.0[0]);
        }
    }

    pub fn to_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = (y * self.width + x) as usize;
            let luma = self.y[i];
            let dcr = self.cr[i] - CHROMA_OFFSET;
            let dcb = self.cb[i] - CHROMA_OFFSET;
            let r = luma + 1.403 * dcr;
            let g = luma - 0.714 * dcr - 0.344 * dcb;
            let b = luma + 1.773 * dcb;
            Rgb([to_u8(r), to_u8(g), to_u8(b)])
        })
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
