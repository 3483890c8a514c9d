//! Restoration chain
//!
//! Fixed stage order:
//!
//! 1. Super-resolution upsample (cubic resize fallback)
//! 2. Gamma correction
//! 3. Bilateral smoothing
//! 4. Detail enhancement
//! 5. CLAHE on luma
//! 6. Unsharp mask
//!
//! Whole-frame mode runs the same chain with lighter settings, see
//! [`StageSettings::for_mode`].

use image::RgbImage;
use tracing::debug;

use crate::filters::{
    bilateral_filter, clahe_luma, detail_enhance, gamma_correct, unsharp_mask,
    FACE_UNSHARP_SIGMA, FRAME_UNSHARP_SIGMA,
};
use crate::params::ParameterSet;
use crate::upscale::{upscale_or_resize, Upscaler};

// ============================================================
// Constants
// ============================================================

/// Largest upscale factor for a face crop
pub const MAX_FACE_SCALE: u32 = 8;

/// Largest upscale factor for the whole frame
pub const MAX_FRAME_SCALE: u32 = 4;

/// Whole-frame bilateral sigmas are reduced by this much
const FRAME_BILATERAL_SIGMA_REDUCTION: f64 = 10.0;

/// Floor for the reduced whole-frame bilateral sigmas
const FRAME_BILATERAL_SIGMA_FLOOR: f64 = 40.0;

/// Whole-frame detail-enhance sigma scale
const FRAME_DETAIL_SCALE: f32 = 0.9;

/// Whole-frame sharpen amount scale
const FRAME_SHARPEN_SCALE: f64 = 0.85;

// ============================================================
// Mode and Stage Settings
// ============================================================

/// What the chain is restoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// Padded face crop, later composited back
    FaceCrop,
    /// The full frame, resized back afterwards
    WholeFrame,
}

impl RestoreMode {
    /// Cap the requested upscale factor for this mode
    pub fn effective_scale(&self, scale: u32) -> u32 {
        let cap = match self {
            RestoreMode::FaceCrop => MAX_FACE_SCALE,
            RestoreMode::WholeFrame => MAX_FRAME_SCALE,
        };
        scale.clamp(1, cap)
    }
}

impl std::fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreMode::FaceCrop => write!(f, "face crop"),
            RestoreMode::WholeFrame => write!(f, "whole frame"),
        }
    }
}

/// Concrete per-stage values after applying the mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSettings {
    pub scale: u32,
    pub gamma: f64,
    pub bilateral_diameter: u32,
    pub bilateral_color_sigma: f64,
    pub bilateral_space_sigma: f64,
    pub detail_sigma_space: f32,
    pub detail_sigma_range: f32,
    pub contrast_clip: f64,
    pub sharpen_sigma: f32,
    pub sharpen_amount: f32,
}

impl StageSettings {
    pub fn for_mode(params: &ParameterSet, mode: RestoreMode, scale: u32) -> Self {
        let scale = mode.effective_scale(scale);
        match mode {
            RestoreMode::FaceCrop => Self {
                scale,
                gamma: params.gamma,
                bilateral_diameter: params.bilateral_diameter,
                bilateral_color_sigma: params.bilateral_color_sigma,
                bilateral_space_sigma: params.bilateral_space_sigma,
                detail_sigma_space: params.detail_sigma_space,
                detail_sigma_range: params.detail_sigma_range,
                contrast_clip: params.local_contrast_clip,
                sharpen_sigma: FACE_UNSHARP_SIGMA,
                sharpen_amount: params.local_sharpen_amount as f32,
            },
            RestoreMode::WholeFrame => Self {
                scale,
                gamma: params.gamma,
                bilateral_diameter: params.bilateral_diameter.saturating_sub(1),
                bilateral_color_sigma: frame_sigma(params.bilateral_color_sigma),
                bilateral_space_sigma: frame_sigma(params.bilateral_space_sigma),
                detail_sigma_space: params.detail_sigma_space * FRAME_DETAIL_SCALE,
                detail_sigma_range: params.detail_sigma_range * FRAME_DETAIL_SCALE,
                contrast_clip: params.local_contrast_clip,
                sharpen_sigma: FRAME_UNSHARP_SIGMA,
                sharpen_amount: (params.local_sharpen_amount * FRAME_SHARPEN_SCALE) as f32,
            },
        }
    }
}

fn frame_sigma(sigma: f64) -> f64 {
    (sigma - FRAME_BILATERAL_SIGMA_REDUCTION).max(FRAME_BILATERAL_SIGMA_FLOOR)
}

// ============================================================
// Chain
// ============================================================

/// Run the restoration chain. The result is `scale` times larger than the
/// input, with `scale` capped per mode.
///
/// Never fails: a missing or failing super-resolution backend is replaced
/// by a cubic resize.
pub fn restore(
    image: &RgbImage,
    params: &ParameterSet,
    mode: RestoreMode,
    scale: u32,
    upscaler: Option<&mut (dyn Upscaler + '_)>,
) -> RgbImage {
    let s = StageSettings::for_mode(params, mode, scale);
    debug!("Restoring {} at x{}: {:?}", mode, s.scale, s);

    let upscaled = upscale_or_resize(upscaler, image, s.scale);
    let corrected = gamma_correct(&upscaled, s.gamma);
    let smoothed = bilateral_filter(
        &corrected,
        s.bilateral_diameter,
        s.bilateral_color_sigma,
        s.bilateral_space_sigma,
    );
    let detailed = detail_enhance(&smoothed, s.detail_sigma_space, s.detail_sigma_range);
    let contrasted = clahe_luma(&detailed, s.contrast_clip);
    unsharp_mask(&contrasted, s.sharpen_sigma, s.sharpen_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upscale::load_upscaler;
    use image::Rgb;
    use std::path::Path;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 100]))
    }

    #[test]
    fn test_effective_scale_caps() {
        assert_eq!(RestoreMode::FaceCrop.effective_scale(10), 8);
        assert_eq!(RestoreMode::FaceCrop.effective_scale(4), 4);
        assert_eq!(RestoreMode::WholeFrame.effective_scale(8), 4);
        assert_eq!(RestoreMode::WholeFrame.effective_scale(2), 2);
    }

    #[test]
    fn test_whole_frame_settings_are_lighter() {
        let params = ParameterSet::default();
        let face = StageSettings::for_mode(&params, RestoreMode::FaceCrop, 4);
        let frame = StageSettings::for_mode(&params, RestoreMode::WholeFrame, 4);

        assert_eq!(frame.bilateral_diameter, face.bilateral_diameter - 1);
        assert_eq!(frame.bilateral_color_sigma, 45.0);
        assert_eq!(frame.bilateral_space_sigma, 45.0);
        assert!((frame.detail_sigma_space - 7.2).abs() < 1e-5);
        assert!((frame.detail_sigma_range - 0.072).abs() < 1e-6);
        assert_eq!(face.sharpen_sigma, 1.0);
        assert_eq!(frame.sharpen_sigma, 0.9);
        assert!((frame.sharpen_amount - 0.35 * 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_frame_sigma_floor() {
        assert_eq!(frame_sigma(45.0), 40.0);
        assert_eq!(frame_sigma(20.0), 40.0);
        assert_eq!(frame_sigma(75.0), 65.0);
    }

    #[test]
    fn test_missing_sr_model_falls_back_to_resize() {
        let image = gradient(24, 16);
        let upscaler = load_upscaler(Path::new("/nonexistent/EDSR_x4.onnx")).ok();
        assert!(upscaler.is_none());

        let face = restore(&image, &ParameterSet::default(), RestoreMode::FaceCrop, 4, None);
        assert_eq!(face.dimensions(), (96, 64));

        let frame = restore(&image, &ParameterSet::default(), RestoreMode::WholeFrame, 8, None);
        assert_eq!(frame.dimensions(), (96, 64));
    }
}
