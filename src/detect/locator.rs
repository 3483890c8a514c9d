//! Two-tier face locator
//!
//! The neural tier runs first; the cascade tier runs only when the neural
//! tier is absent or finds nothing. The largest surviving box wins.

use image::RgbImage;
use std::path::Path;
use tracing::{debug, info, warn};

use super::cascade::SeetaCascadeDetector;
use super::onnx::load_neural_detector;
use super::types::{
    CascadeFaceDetector, CascadeOptions, Detection, NeuralFaceDetector,
    DEFAULT_CONFIDENCE_THRESHOLD,
};
use crate::region::Rect;

/// Face locator holding whichever detector tiers loaded
pub struct FaceLocator {
    neural: Option<Box<dyn NeuralFaceDetector>>,
    cascade: Option<Box<dyn CascadeFaceDetector>>,
    confidence_threshold: f32,
}

impl Default for FaceLocator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl FaceLocator {
    /// Create a locator with no tiers
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            neural: None,
            cascade: None,
            confidence_threshold,
        }
    }

    /// Attach a neural tier
    #[must_use]
    pub fn with_neural(mut self, detector: Box<dyn NeuralFaceDetector>) -> Self {
        self.neural = Some(detector);
        self
    }

    /// Attach a cascade tier
    #[must_use]
    pub fn with_cascade(mut self, detector: Box<dyn CascadeFaceDetector>) -> Self {
        self.cascade = Some(detector);
        self
    }

    /// Load the configured tiers. A tier that fails to load is left out.
    pub fn load(
        proto: Option<&Path>,
        weights: Option<&Path>,
        cascade: Option<&Path>,
        confidence_threshold: f32,
    ) -> Self {
        let mut locator = Self::new(confidence_threshold);

        if let Some(weights) = weights {
            match load_neural_detector(proto, weights) {
                Ok(detector) => {
                    info!("Neural face detector loaded: {}", detector.name());
                    locator.neural = Some(detector);
                }
                Err(e) => warn!("Neural face detector unavailable: {}", e),
            }
        }

        if let Some(path) = cascade {
            match SeetaCascadeDetector::load(path, CascadeOptions::default()) {
                Ok(detector) => {
                    info!("Cascade face detector loaded: {} ({})", detector.name(), path.display());
                    locator.cascade = Some(Box::new(detector));
                }
                Err(e) => warn!("Cascade face detector unavailable: {}", e),
            }
        }

        locator
    }

    pub fn has_neural(&self) -> bool {
        self.neural.is_some()
    }

    pub fn has_cascade(&self) -> bool {
        self.cascade.is_some()
    }

    /// Names of the loaded tiers in the order they are tried
    pub fn tiers(&self) -> Vec<&str> {
        let neural = self.neural.as_deref().map(|d| d.name());
        let cascade = self.cascade.as_deref().map(|d| d.name());
        neural.into_iter().chain(cascade).collect()
    }

    /// Locate the principal face.
    ///
    /// Returns a rectangle inside the image bounds, or an empty rectangle
    /// when no tier finds a face.
    pub fn locate(&mut self, image: &RgbImage) -> Rect {
        let (width, height) = image.dimensions();

        if let Some(neural) = self.neural.as_mut() {
            match neural.detect(image, self.confidence_threshold) {
                Ok(detections) => {
                    let best = largest_detection(
                        &detections,
                        width,
                        height,
                        self.confidence_threshold,
                    );
                    debug!(
                        "Neural tier: {} candidates, best {:?}",
                        detections.len(),
                        best
                    );
                    if !best.is_empty() {
                        return best;
                    }
                }
                Err(e) => warn!("Neural face detection failed: {}", e),
            }
        }

        if let Some(cascade) = self.cascade.as_mut() {
            let gray = imageproc::contrast::equalize_histogram(&image::imageops::grayscale(image));
            let boxes = cascade.detect(&gray);
            let best = largest_box(&boxes, width, height);
            debug!("Cascade tier: {} candidates, best {:?}", boxes.len(), best);
            return best;
        }

        Rect::default()
    }
}

/// Select the largest detection at or above `threshold`.
///
/// Boxes are converted to pixels and clamped before comparing areas. The
/// first of several equally large boxes wins.
pub fn largest_detection(
    detections: &[Detection],
    width: u32,
    height: u32,
    threshold: f32,
) -> Rect {
    let rects = detections
        .iter()
        .filter(|det| det.confidence >= threshold)
        .map(|det| det.to_pixel_rect(width, height));
    first_largest(rects)
}

/// Select the largest box after clamping to the image
pub fn largest_box(boxes: &[Rect], width: u32, height: u32) -> Rect {
    let rects = boxes.iter().map(|r| {
        Rect::clamped(
            i64::from(r.x),
            i64::from(r.y),
            i64::from(r.width),
            i64::from(r.height),
            (width, height),
        )
    });
    first_largest(rects)
}

fn first_largest(rects: impl Iterator<Item = Rect>) -> Rect {
    rects
        .filter(|r| !r.is_empty())
        .fold(Rect::default(), |best, r| {
            if r.area() > best.area() {
                r
            } else {
                best
            }
        })
}
