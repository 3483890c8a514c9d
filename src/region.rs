//! Rectangles and region-of-interest extraction

use image::RgbImage;

/// Horizontal padding per side, as a fraction of the face width
const HORIZONTAL_PADDING: f64 = 0.35;

/// Vertical padding per side, as a fraction of the face height
const VERTICAL_PADDING: f64 = 0.45;

/// Axis-aligned rectangle in pixel coordinates
///
/// Rectangles built through the `*_clamped` constructors lie within the
/// given bounds. A zero-area rectangle means "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect a signed rectangle with `[0, bound_w) x [0, bound_h)`
    pub fn clamped(x: i64, y: i64, width: i64, height: i64, bounds: (u32, u32)) -> Self {
        Self::from_corners_clamped(x, y, x + width.max(0), y + height.max(0), bounds)
    }

    /// Build from top-left and bottom-right corners, intersected with the bounds
    pub fn from_corners_clamped(x1: i64, y1: i64, x2: i64, y2: i64, bounds: (u32, u32)) -> Self {
        let (bw, bh) = (i64::from(bounds.0), i64::from(bounds.1));
        let left = x1.clamp(0, bw);
        let top = y1.clamp(0, bh);
        let right = x2.clamp(0, bw);
        let bottom = y2.clamp(0, bh);

        if right <= left || bottom <= top {
            return Self::default();
        }

        Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Geometric center, rounded toward the top-left
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Whether the rectangle lies entirely within a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Padded face region and its pixels
#[derive(Debug, Clone)]
pub struct Region {
    /// Region of interest in base-image coordinates
    pub roi: Rect,
    /// Copy of the base image under `roi`
    pub crop: RgbImage,
}

/// Pad a face box to include hair, chin and ears, clamp it to the image,
/// and crop it.
///
/// Padding shrinks at image edges rather than failing. An empty face box
/// yields an empty region.
pub fn extract_region(image: &RgbImage, face: Rect) -> Region {
    let pad_x = (f64::from(face.width) * HORIZONTAL_PADDING) as i64;
    let pad_y = (f64::from(face.height) * VERTICAL_PADDING) as i64;

    let roi = if face.is_empty() {
        Rect::default()
    } else {
        Rect::clamped(
            i64::from(face.x) - pad_x,
            i64::from(face.y) - pad_y,
            i64::from(face.width) + 2 * pad_x,
            i64::from(face.height) + 2 * pad_y,
            image.dimensions(),
        )
    };

    let crop = image::imageops::crop_imm(image, roi.x, roi.y, roi.width, roi.height).to_image();

    Region { roi, crop }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_clamped_rect_inside_bounds() {
        let r = Rect::clamped(-10, -5, 50, 40, (30, 30));
        assert_eq!(r, Rect::new(0, 0, 30, 30));
        assert!(r.fits_within(30, 30));
    }

    #[test]
    fn test_clamped_rect_outside_bounds_is_empty() {
        let r = Rect::clamped(100, 100, 20, 20, (50, 50));
        assert!(r.is_empty());
        assert_eq!(r.area(), 0);

        let negative = Rect::from_corners_clamped(10, 10, 5, 5, (50, 50));
        assert!(negative.is_empty());
    }

    #[test]
    fn test_center() {
        let r = Rect::new(10, 20, 31, 41);
        assert_eq!(r.center(), (25, 40));
    }

    #[test]
    fn test_extract_region_padding() {
        let image = RgbImage::from_pixel(400, 400, Rgb([10, 20, 30]));
        let face = Rect::new(150, 150, 100, 100);
        let region = extract_region(&image, face);

        // 35 px per side horizontally, 45 px per side vertically
        assert_eq!(region.roi, Rect::new(115, 105, 170, 190));
        assert_eq!(region.crop.dimensions(), (170, 190));
    }

    #[test]
    fn test_extract_region_at_corner_stays_in_bounds() {
        let image = RgbImage::from_fn(120, 90, |x, y| Rgb([x as u8, y as u8, 0]));
        for face in [
            Rect::new(0, 0, 40, 40),
            Rect::new(80, 50, 40, 40),
            Rect::new(0, 50, 40, 40),
            Rect::new(80, 0, 40, 40),
        ] {
            let region = extract_region(&image, face);
            assert!(!region.roi.is_empty());
            assert!(region.roi.fits_within(120, 90));
            assert_eq!(region.crop.dimensions(), (region.roi.width, region.roi.height));
        }
    }

    #[test]
    fn test_extract_region_copies_pixels() {
        let image = RgbImage::from_fn(100, 100, |x, y| Rgb([x as u8, y as u8, 7]));
        let region = extract_region(&image, Rect::new(40, 40, 20, 20));
        let (rx, ry) = (region.roi.x, region.roi.y);
        assert_eq!(region.crop.get_pixel(0, 0), image.get_pixel(rx, ry));
    }

    #[test]
    fn test_extract_region_empty_face() {
        let image = RgbImage::new(10, 10);
        let region = extract_region(&image, Rect::default());
        assert!(region.roi.is_empty());
        assert_eq!(region.crop.dimensions(), (0, 0));
    }
}
