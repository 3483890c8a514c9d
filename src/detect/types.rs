//! Face detection core types
//!
//! Detector backends are capabilities behind the traits below. Loading a
//! backend returns a `Result`; the locator turns a failed load into an
//! absent tier.

use image::{GrayImage, RgbImage};
use std::path::PathBuf;
use thiserror::Error;

use crate::region::Rect;

// ============================================================
// Constants
// ============================================================

/// Default minimum confidence for neural detections
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Default scale step between cascade pyramid levels
pub const DEFAULT_CASCADE_SCALE_FACTOR: f32 = 1.1;

/// Default smallest face the cascade searches for (pixels)
pub const DEFAULT_CASCADE_MIN_FACE: u32 = 30;

/// Default cascade classifier score threshold
pub const DEFAULT_CASCADE_SCORE_THRESHOLD: f64 = 2.0;

/// Default cascade sliding window step (pixels)
pub const DEFAULT_CASCADE_WINDOW_STEP: u32 = 4;

// ============================================================
// Error Types
// ============================================================

/// Detector error types
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Backend not compiled in: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, DetectError>;

// ============================================================
// Core Data Structures
// ============================================================

/// One neural detection in relative `[0, 1]` coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Detector confidence
    pub confidence: f32,
    /// Left edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
    /// Right edge
    pub x2: f32,
    /// Bottom edge
    pub y2: f32,
}

impl Detection {
    /// Convert to a pixel rectangle clamped to a `width` x `height` image
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Rect {
        let (w, h) = (width as f32, height as f32);
        let ax = (self.x1 * w) as i64;
        let ay = (self.y1 * h) as i64;
        let bx = (self.x2 * w) as i64;
        let by = (self.y2 * h) as i64;
        Rect::from_corners_clamped(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by), (width, height))
    }
}

/// Multi-scale cascade scan settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeOptions {
    /// Scale step between pyramid levels (> 1.0)
    pub scale_factor: f32,
    /// Smallest face searched for, in pixels
    pub min_face_size: u32,
    /// Classifier score threshold
    pub score_threshold: f64,
    /// Sliding window step in pixels
    pub window_step: u32,
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_CASCADE_SCALE_FACTOR,
            min_face_size: DEFAULT_CASCADE_MIN_FACE,
            score_threshold: DEFAULT_CASCADE_SCORE_THRESHOLD,
            window_step: DEFAULT_CASCADE_WINDOW_STEP,
        }
    }
}

// ============================================================
// Capability Traits
// ============================================================

/// Neural face detector tier
pub trait NeuralFaceDetector {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Detect faces, returning candidates at or above `threshold` in
    /// detector output order.
    fn detect(&mut self, image: &RgbImage, threshold: f32) -> Result<Vec<Detection>>;
}

/// Classical cascade detector tier
pub trait CascadeFaceDetector {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Scan a histogram-equalized grayscale image, returning absolute boxes
    fn detect(&mut self, gray: &GrayImage) -> Vec<Rect>;
}
