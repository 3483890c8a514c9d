//! Super-resolution upsampling with a cubic-resize fallback
//!
//! # Features
//!
//! - [`Upscaler`] capability trait for super-resolution backends
//! - ONNX Runtime backend (feature `onnx`) for EDSR/ESPCN/FSRCNN/LapSRN exports
//! - Model family inferred from the file name
//! - [`upscale_or_resize`] never fails: any backend error falls back to a
//!   Catmull-Rom cubic resize by the same factor
//!
//! # Example
//!
//! ```
//! use face_enhance::upscale::upscale_or_resize;
//! use image::RgbImage;
//!
//! let image = RgbImage::new(20, 10);
//! let out = upscale_or_resize(None, &image, 4);
//! assert_eq!(out.dimensions(), (80, 40));
//! ```

mod cubic;
mod onnx;

use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub use cubic::cubic_resize;
pub use onnx::load_upscaler;

// ============================================================
// Error Types
// ============================================================

/// Super-resolution error types
#[derive(Debug, Error)]
pub enum UpscaleError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Unexpected output size {actual:?}, expected {expected:?}")]
    OutputSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Backend not compiled in: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, UpscaleError>;

// ============================================================
// Model Family
// ============================================================

/// Super-resolution network family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SrModelKind {
    #[default]
    Edsr,
    Espcn,
    Fsrcnn,
    Lapsrn,
}

impl SrModelKind {
    /// Infer the family from a model file name, case-insensitively.
    /// Unrecognized names are treated as EDSR.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.contains("espcn") {
            Self::Espcn
        } else if name.contains("fsrcnn") {
            Self::Fsrcnn
        } else if name.contains("lapsrn") {
            Self::Lapsrn
        } else {
            Self::Edsr
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Edsr => "edsr",
            Self::Espcn => "espcn",
            Self::Fsrcnn => "fsrcnn",
            Self::Lapsrn => "lapsrn",
        }
    }
}

impl std::fmt::Display for SrModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================
// Capability Trait
// ============================================================

/// Super-resolution capability
pub trait Upscaler {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Upsample by an integer factor
    fn upscale(&mut self, image: &RgbImage, scale: u32) -> Result<RgbImage>;
}

/// Upsample with the given backend, falling back to a cubic resize when
/// the backend is absent or fails.
pub fn upscale_or_resize(
    upscaler: Option<&mut (dyn Upscaler + '_)>,
    image: &RgbImage,
    scale: u32,
) -> RgbImage {
    let scale = scale.max(1);
    let expected = (image.width() * scale, image.height() * scale);

    let Some(upscaler) = upscaler else {
        debug!("No super-resolution model, cubic resize x{}", scale);
        return cubic_resize(image, scale);
    };

    match upscaler.upscale(image, scale) {
        Ok(out) if out.dimensions() == expected => {
            debug!("Super-resolution ({}) x{}", upscaler.name(), scale);
            out
        }
        Ok(out) => {
            let err = UpscaleError::OutputSize {
                expected,
                actual: out.dimensions(),
            };
            warn!("Super-resolution ({}) failed: {}", upscaler.name(), err);
            cubic_resize(image, scale)
        }
        Err(e) => {
            warn!("Super-resolution ({}) failed: {}", upscaler.name(), e);
            cubic_resize(image, scale)
        }
    }
}
