//! Super-resolution through ONNX Runtime
//!
//! Input is a `1x3xHxW` RGB tensor in `[0, 1]`; output is `1x3x(sH)x(sW)`.
//! Only compiled with the `onnx` feature.

use std::path::Path;
use tracing::info;

use super::{Result, SrModelKind, UpscaleError, Upscaler};

/// Load the super-resolution model at `path`
pub fn load_upscaler(path: &Path) -> Result<Box<dyn Upscaler>> {
    if !path.is_file() {
        return Err(UpscaleError::ModelNotFound(path.to_path_buf()));
    }

    let kind = SrModelKind::from_path(path);
    info!("Super-resolution model family: {}", kind);
    load_backend(path, kind)
}

#[cfg(feature = "onnx")]
fn load_backend(path: &Path, kind: SrModelKind) -> Result<Box<dyn Upscaler>> {
    Ok(Box::new(backend::OnnxUpscaler::load(path, kind)?))
}

#[cfg(not(feature = "onnx"))]
fn load_backend(_path: &Path, _kind: SrModelKind) -> Result<Box<dyn Upscaler>> {
    Err(UpscaleError::Unsupported("super-resolution requires the `onnx` feature"))
}

#[cfg(feature = "onnx")]
mod backend {
    use image::{Rgb, RgbImage};
    use ndarray::{Array4, Ix4};
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;

    use crate::upscale::{Result, SrModelKind, UpscaleError, Upscaler};

    pub struct OnnxUpscaler {
        session: Session,
        name: String,
    }

    impl OnnxUpscaler {
        pub fn load(path: &Path, kind: SrModelKind) -> Result<Self> {
            let session = Session::builder()
                .and_then(|builder| builder.commit_from_file(path))
                .map_err(|e| UpscaleError::LoadFailed(e.to_string()))?;
            Ok(Self {
                session,
                name: format!("onnx-{}", kind),
            })
        }

        fn tensor(image: &RgbImage) -> Array4<f32> {
            let (w, h) = image.dimensions();
            let mut input = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
            for (x, y, px) in image.enumerate_pixels() {
                for c in 0..3 {
                    input[[0, c, y as usize, x as usize]] = f32::from(px[c]) / 255.0;
                }
            }
            input
        }
    }

    impl Upscaler for OnnxUpscaler {
        fn name(&self) -> &str {
            &self.name
        }

        fn upscale(&mut self, image: &RgbImage, scale: u32) -> Result<RgbImage> {
            let input = Tensor::from_array(Self::tensor(image))
                .map_err(|e| UpscaleError::InferenceFailed(e.to_string()))?;
            let outputs = self
                .session
                .run(ort::inputs![input])
                .map_err(|e| UpscaleError::InferenceFailed(e.to_string()))?;
            let raw = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| UpscaleError::InferenceFailed(e.to_string()))?;

            let expected = (image.width() * scale, image.height() * scale);
            let rank = raw.ndim();
            let raw = raw.into_dimensionality::<Ix4>().map_err(|_| {
                UpscaleError::InferenceFailed(format!("unexpected output rank {}", rank))
            })?;
            let (_, channels, h, w) = raw.dim();
            if channels != 3 {
                return Err(UpscaleError::InferenceFailed(format!(
                    "expected 3 output channels, got {}",
                    channels
                )));
            }
            let actual = (w as u32, h as u32);
            if actual != expected {
                return Err(UpscaleError::OutputSize { expected, actual });
            }

            Ok(RgbImage::from_fn(actual.0, actual.1, |x, y| {
                let (x, y) = (x as usize, y as usize);
                let px = |c: usize| (raw[[0, c, y, x]] * 255.0).round().clamp(0.0, 255.0) as u8;
                Rgb([px(0), px(1), px(2)])
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_reported() {
        let result = load_upscaler(Path::new("/nonexistent/EDSR_x4.onnx"));
        assert!(matches!(result, Err(UpscaleError::ModelNotFound(_))));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_backend_unsupported_without_feature() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("ESPCN_x2.onnx");
        std::fs::write(&model, b"model").unwrap();
        assert!(matches!(load_upscaler(&model), Err(UpscaleError::Unsupported(_))));
    }
}
