//! Native image filters used by restoration and the finishing pass
//!
//! # Features
//!
//! - Gamma correction via lookup table
//! - Edge-preserving bilateral smoothing
//! - Detail enhancement (domain transform base/detail split on luma)
//! - CLAHE on luma with an 8x8 tile grid
//! - Unsharp mask
//!
//! All filters take `&RgbImage` and return a new image of the same size.
//!
//! # Example
//!
//! ```
//! use face_enhance::filters::{clahe_luma, unsharp_mask};
//! use image::{Rgb, RgbImage};
//!
//! let image = RgbImage::from_pixel(32, 32, Rgb([120, 110, 100]));
//! let out = unsharp_mask(&clahe_luma(&image, 1.2), 0.8, 0.15);
//! assert_eq!(out.dimensions(), (32, 32));
//! ```

mod bilateral;
mod clahe;
mod color;
mod detail;
mod gamma;
mod unsharp;

pub use bilateral::bilateral_filter;
pub use clahe::{clahe_gray, clahe_luma, DEFAULT_TILE_GRID};
pub use color::YCrCbPlanes;
pub use detail::{detail_enhance, DETAIL_GAIN};
pub use gamma::{gamma_correct, gamma_lut};
pub use unsharp::{unsharp_mask, FACE_UNSHARP_SIGMA, FINAL_UNSHARP_SIGMA, FRAME_UNSHARP_SIGMA};
