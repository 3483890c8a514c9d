//! Cascade detector tier backed by `rustface` (SeetaFace funnel cascade)

use image::GrayImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::types::{CascadeFaceDetector, CascadeOptions, DetectError, Result};
use crate::region::Rect;

/// SeetaFace cascade loaded from a model file
pub struct SeetaCascadeDetector {
    detector: Box<dyn rustface::Detector>,
    options: CascadeOptions,
}

impl SeetaCascadeDetector {
    /// Load the cascade model at `path`
    pub fn load(path: &Path, options: CascadeOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(DetectError::ModelNotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| DetectError::LoadFailed(e.to_string()))?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| DetectError::LoadFailed(e.to_string()))?;

        let mut detector = rustface::create_detector_with_model(model);
        detector.set_min_face_size(options.min_face_size);
        detector.set_score_thresh(options.score_threshold);
        detector.set_pyramid_scale_factor(1.0 / options.scale_factor.max(1.01));
        detector.set_slide_window_step(options.window_step, options.window_step);

        Ok(Self { detector, options })
    }
}

impl CascadeFaceDetector for SeetaCascadeDetector {
    fn name(&self) -> &str {
        "seetaface-cascade"
    }

    fn detect(&mut self, gray: &GrayImage) -> Vec<Rect> {
        let (width, height) = gray.dimensions();
        if width < self.options.min_face_size || height < self.options.min_face_size {
            return Vec::new();
        }

        let faces = self
            .detector
            .detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Rect::clamped(
                    i64::from(bbox.x()),
                    i64::from(bbox.y()),
                    i64::from(bbox.width()),
                    i64::from(bbox.height()),
                    (width, height),
                )
            })
            .filter(|rect| !rect.is_empty())
            .collect()
    }
}
