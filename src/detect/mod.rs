//! Face Detection module
//!
//! Locates the principal face with a two-tier strategy.
//!
//! # Tiers
//!
//! 1. **Neural** ([`onnx`]) - SSD-style detector over ONNX Runtime
//!    (`onnx` feature)
//! 2. **Cascade** ([`cascade`]) - SeetaFace funnel cascade via `rustface`
//!
//! A tier whose model is missing or fails to load is skipped. When no
//! tier finds a face the locator returns an empty [`Rect`](crate::Rect).
//!
//! # Example
//!
//! ```rust,no_run
//! use face_enhance::FaceLocator;
//! use std::path::Path;
//!
//! let image = image::open("portrait.jpg").unwrap().to_rgb8();
//! let mut locator = FaceLocator::load(
//!     None,
//!     Some(Path::new("models/opencv_face_detector.onnx")),
//!     Some(Path::new("models/seeta_fd_frontal_v1.0.bin")),
//!     0.5,
//! );
//! let face = locator.locate(&image);
//! if face.is_empty() {
//!     println!("No face");
//! }
//! ```

pub mod cascade;
mod locator;
pub mod onnx;
mod types;

// Re-export public API
pub use cascade::SeetaCascadeDetector;
pub use locator::{largest_box, largest_detection, FaceLocator};
pub use onnx::load_neural_detector;
pub use types::{
    CascadeFaceDetector, CascadeOptions, DetectError, Detection, NeuralFaceDetector, Result,
    DEFAULT_CONFIDENCE_THRESHOLD,
};
