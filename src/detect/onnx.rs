//! Neural detector tier: SSD-style face detector run through ONNX Runtime
//!
//! The network takes a 300x300 BGR blob with the (104, 177, 123) channel
//! means subtracted and emits `[1, 1, N, 7]` rows of
//! `(image_id, label, confidence, x1, y1, x2, y2)` in relative coordinates.
//! Only compiled with the `onnx` feature; without it loading reports
//! [`DetectError::Unsupported`].

use std::path::Path;

use super::types::{DetectError, NeuralFaceDetector, Result};

/// Load the neural detector.
///
/// `proto`, when given, must exist alongside the weights file for the
/// tier to be considered configured.
pub fn load_neural_detector(
    proto: Option<&Path>,
    weights: &Path,
) -> Result<Box<dyn NeuralFaceDetector>> {
    if let Some(proto) = proto {
        if !proto.is_file() {
            return Err(DetectError::ModelNotFound(proto.to_path_buf()));
        }
    }
    if !weights.is_file() {
        return Err(DetectError::ModelNotFound(weights.to_path_buf()));
    }

    load_backend(weights)
}

#[cfg(feature = "onnx")]
fn load_backend(weights: &Path) -> Result<Box<dyn NeuralFaceDetector>> {
    Ok(Box::new(backend::OnnxSsdDetector::load(weights)?))
}

#[cfg(not(feature = "onnx"))]
fn load_backend(_weights: &Path) -> Result<Box<dyn NeuralFaceDetector>> {
    Err(DetectError::Unsupported("neural detector requires the `onnx` feature"))
}

#[cfg(feature = "onnx")]
mod backend {
    use image::imageops::FilterType;
    use image::RgbImage;
    use ndarray::Array4;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;

    use crate::detect::types::{DetectError, Detection, NeuralFaceDetector, Result};

    /// Network input edge length
    const INPUT_SIZE: u32 = 300;

    /// Per-channel means in B, G, R order
    const CHANNEL_MEANS: [f32; 3] = [104.0, 177.0, 123.0];

    /// Values per detection row
    const ROW_LEN: usize = 7;

    pub struct OnnxSsdDetector {
        session: Session,
    }

    impl OnnxSsdDetector {
        pub fn load(path: &Path) -> Result<Self> {
            let session = Session::builder()
                .and_then(|builder| builder.commit_from_file(path))
                .map_err(|e| DetectError::LoadFailed(e.to_string()))?;
            Ok(Self { session })
        }

        fn blob(image: &RgbImage) -> Array4<f32> {
            let resized =
                image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
            let mut blob = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
            for (x, y, px) in resized.enumerate_pixels() {
                let (x, y) = (x as usize, y as usize);
                blob[[0, 0, y, x]] = f32::from(px[2]) - CHANNEL_MEANS[0];
                blob[[0, 1, y, x]] = f32::from(px[1]) - CHANNEL_MEANS[1];
                blob[[0, 2, y, x]] = f32::from(px[0]) - CHANNEL_MEANS[2];
            }
            blob
        }
    }

    impl NeuralFaceDetector for OnnxSsdDetector {
        fn name(&self) -> &str {
            "onnx-ssd"
        }

        fn detect(&mut self, image: &RgbImage, threshold: f32) -> Result<Vec<Detection>> {
            let input = Tensor::from_array(Self::blob(image))
                .map_err(|e| DetectError::InferenceFailed(e.to_string()))?;
            let outputs = self
                .session
                .run(ort::inputs![input])
                .map_err(|e| DetectError::InferenceFailed(e.to_string()))?;
            let raw = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| DetectError::InferenceFailed(e.to_string()))?;

            if raw.shape().last().copied() != Some(ROW_LEN) {
                return Err(DetectError::InferenceFailed(format!(
                    "unexpected output shape {:?}",
                    raw.shape()
                )));
            }

            let values: Vec<f32> = raw.iter().copied().collect();
            Ok(values
                .chunks_exact(ROW_LEN)
                .map(|row| Detection {
                    confidence: row[2],
                    x1: row[3],
                    y1: row[4],
                    x2: row[5],
                    y2: row[6],
                })
                .filter(|det| det.confidence >= threshold)
                .collect())
        }
    }
}
