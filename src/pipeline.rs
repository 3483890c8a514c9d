//! Single-image enhancement pipeline
//!
//! The run is a strictly linear state machine:
//!
//! ```text
//! Start -> Loaded -> (FaceFound | NoFace) -> Restored -> [Composited] -> FinalPassed -> Saved
//! ```
//!
//! Each state is its own type and transitions consume the previous state,
//! so a composite can only follow a found face and a save can only follow
//! the final pass. [`PipelineStage`] names the states for logging.
//!
//! # Example
//!
//! ```rust,no_run
//! use face_enhance::{Enhancer, RunConfig};
//!
//! let config = RunConfig::new("portrait.jpg", "portrait_enhanced.png");
//! let report = Enhancer::new(config).run()?;
//! println!("{:?} -> {:?}", report.path, report.dimensions);
//! # Ok::<(), face_enhance::EnhanceError>(())
//! ```

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::composite::{composite, CompositeError};
use crate::config::RunConfig;
use crate::detect::FaceLocator;
use crate::error::{EnhanceError, Result};
use crate::filters::{clahe_luma, unsharp_mask, FINAL_UNSHARP_SIGMA};
use crate::normalize::normalize_owned;
use crate::params::ParameterSet;
use crate::region::{extract_region, Rect, Region};
use crate::restore::{restore, RestoreMode};
use crate::upscale::{load_upscaler, Upscaler};

// ============================================================
// Stages
// ============================================================

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    /// Configuration resolved, nothing decoded yet
    #[default]
    Start,
    /// Base image decoded and normalized
    Loaded,
    /// A face was located
    FaceFound,
    /// No face, or no usable detector
    NoFace,
    /// Restoration chain finished
    Restored,
    /// Restored region blended back into the base image
    Composited,
    /// Final global pass done (or skipped)
    FinalPassed,
    /// Output written
    Saved,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Start => "Start",
            PipelineStage::Loaded => "Loaded",
            PipelineStage::FaceFound => "FaceFound",
            PipelineStage::NoFace => "NoFace",
            PipelineStage::Restored => "Restored",
            PipelineStage::Composited => "Composited",
            PipelineStage::FinalPassed => "FinalPassed",
            PipelineStage::Saved => "Saved",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::Start => "reading configuration",
            PipelineStage::Loaded => "image decoded",
            PipelineStage::FaceFound => "face located",
            PipelineStage::NoFace => "no face, whole-frame path",
            PipelineStage::Restored => "restoration chain done",
            PipelineStage::Composited => "region blended",
            PipelineStage::FinalPassed => "final pass done",
            PipelineStage::Saved => "output written",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description())
    }
}

/// Which restoration path a run took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePath {
    /// Face crop restored and composited back
    FaceRegion,
    /// Whole frame restored and resized back
    WholeFrame,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub path: RestorePath,
    /// Located face, if any
    pub face: Option<Rect>,
    /// Padded region that was restored, on the face path
    pub roi: Option<Rect>,
    /// Output dimensions (always the input dimensions)
    pub dimensions: (u32, u32),
    /// Whether the final pass changed anything
    pub final_pass_applied: bool,
    /// Where the output was written, after [`Enhancer::run`]
    pub output: Option<PathBuf>,
}

// ============================================================
// Typed States
// ============================================================

/// Decoded base image in canonical layout
#[derive(Debug)]
pub struct Loaded {
    image: RgbImage,
}

/// Outcome of face location
#[derive(Debug)]
pub enum Located {
    FaceFound(FaceFound),
    NoFace(NoFace),
}

#[derive(Debug)]
pub struct FaceFound {
    image: RgbImage,
    face: Rect,
}

#[derive(Debug)]
pub struct NoFace {
    image: RgbImage,
}

/// Face region restored at the upscaled resolution
#[derive(Debug)]
pub struct RestoredRegion {
    base: RgbImage,
    face: Rect,
    region: Region,
    restored: RgbImage,
}

/// Whole frame restored and resized back to the input size
#[derive(Debug)]
pub struct RestoredFrame {
    image: RgbImage,
    face: Option<Rect>,
}

/// Full-size image ready for the final pass
#[derive(Debug)]
pub struct Assembled {
    image: RgbImage,
    path: RestorePath,
    face: Option<Rect>,
    roi: Option<Rect>,
}

/// Finished image with its report
#[derive(Debug)]
pub struct FinalPassed {
    pub image: RgbImage,
    pub report: RunReport,
}

impl Loaded {
    pub fn new(image: DynamicImage) -> Self {
        let image = normalize_owned(image);
        debug!("{}: {}x{}", PipelineStage::Loaded, image.width(), image.height());
        Self { image }
    }

    /// Decode and normalize the input file
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(|source| EnhanceError::InputDecode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(image))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn locate(self, locator: &mut FaceLocator) -> Located {
        let face = locator.locate(&self.image);
        if face.is_empty() {
            info!("{}", PipelineStage::NoFace);
            Located::NoFace(NoFace { image: self.image })
        } else {
            info!("{}: {:?}", PipelineStage::FaceFound, face);
            Located::FaceFound(FaceFound {
                image: self.image,
                face,
            })
        }
    }
}

impl FaceFound {
    pub fn face(&self) -> Rect {
        self.face
    }

    /// Restore the padded face crop
    pub fn restore_region(
        self,
        params: &ParameterSet,
        scale: u32,
        upscaler: Option<&mut (dyn Upscaler + '_)>,
    ) -> RestoredRegion {
        let region = extract_region(&self.image, self.face);
        debug!("ROI {:?} around face {:?}", region.roi, self.face);

        let restored = restore(&region.crop, params, RestoreMode::FaceCrop, scale, upscaler);
        debug!(
            "{}: {}x{}",
            PipelineStage::Restored,
            restored.width(),
            restored.height()
        );

        RestoredRegion {
            base: self.image,
            face: self.face,
            region,
            restored,
        }
    }

    /// Restore the whole frame even though a face was found
    pub fn restore_frame(
        self,
        params: &ParameterSet,
        scale: u32,
        upscaler: Option<&mut (dyn Upscaler + '_)>,
    ) -> RestoredFrame {
        let mut frame = restore_whole_frame(self.image, params, scale, upscaler);
        frame.face = Some(self.face);
        frame
    }
}

impl NoFace {
    pub fn restore_frame(
        self,
        params: &ParameterSet,
        scale: u32,
        upscaler: Option<&mut (dyn Upscaler + '_)>,
    ) -> RestoredFrame {
        restore_whole_frame(self.image, params, scale, upscaler)
    }
}

fn restore_whole_frame(
    image: RgbImage,
    params: &ParameterSet,
    scale: u32,
    upscaler: Option<&mut (dyn Upscaler + '_)>,
) -> RestoredFrame {
    let (width, height) = image.dimensions();
    let restored = restore(&image, params, RestoreMode::WholeFrame, scale, upscaler);
    let image = imageops::resize(&restored, width, height, FilterType::Lanczos3);
    debug!("{}: whole frame back to {}x{}", PipelineStage::Restored, width, height);
    RestoredFrame { image, face: None }
}

impl RestoredRegion {
    /// Blend the restored region back into the base image
    pub fn composite(self) -> std::result::Result<Assembled, CompositeError> {
        let roi = self.region.roi;
        let image = composite(&self.base, &self.restored, roi)?;
        debug!("{}: blended into {:?}", PipelineStage::Composited, roi);

        Ok(Assembled {
            image,
            path: RestorePath::FaceRegion,
            face: Some(self.face),
            roi: Some(roi),
        })
    }
}

impl RestoredFrame {
    pub fn into_assembled(self) -> Assembled {
        Assembled {
            image: self.image,
            path: RestorePath::WholeFrame,
            face: self.face,
            roi: None,
        }
    }
}

impl Assembled {
    pub fn final_pass(self, params: &ParameterSet, enabled: bool) -> FinalPassed {
        let applied = enabled
            && (params.global_contrast_clip > 0.0 || params.global_sharpen_amount > 0.0);
        let image = final_pass(self.image, params, enabled);
        debug!("{}: applied = {}", PipelineStage::FinalPassed, applied);

        FinalPassed {
            report: RunReport {
                path: self.path,
                face: self.face,
                roi: self.roi,
                dimensions: image.dimensions(),
                final_pass_applied: applied,
                output: None,
            },
            image,
        }
    }
}

impl FinalPassed {
    /// Encode and write; the format follows the file extension
    pub fn save(mut self, path: &Path) -> Result<RunReport> {
        self.image
            .save(path)
            .map_err(|source| EnhanceError::OutputEncode {
                path: path.to_path_buf(),
                source,
            })?;
        info!("{}: {}", PipelineStage::Saved, path.display());
        self.report.output = Some(path.to_path_buf());
        Ok(self.report)
    }
}

/// Global touch-up after compositing.
///
/// Contrast and sharpening are gated independently by their own value
/// being positive, and both by `enabled`.
pub fn final_pass(image: RgbImage, params: &ParameterSet, enabled: bool) -> RgbImage {
    if !enabled {
        return image;
    }

    let image = if params.global_contrast_clip > 0.0 {
        clahe_luma(&image, params.global_contrast_clip)
    } else {
        image
    };

    if params.global_sharpen_amount > 0.0 {
        unsharp_mask(
            &image,
            FINAL_UNSHARP_SIGMA,
            params.global_sharpen_amount as f32,
        )
    } else {
        image
    }
}

// ============================================================
// Enhancer
// ============================================================

/// Runs one image through the pipeline with the capabilities loaded for
/// this run
pub struct Enhancer {
    config: RunConfig,
    locator: FaceLocator,
    upscaler: Option<Box<dyn Upscaler>>,
}

impl Enhancer {
    /// Load the configured capabilities. Missing or unloadable models are
    /// logged and left out.
    pub fn new(config: RunConfig) -> Self {
        let locator = FaceLocator::load(
            config.detector_proto.as_deref(),
            config.detector_weights.as_deref(),
            config.cascade.as_deref(),
            config.confidence,
        );
        if locator.tiers().is_empty() {
            warn!("No face detector available, every image takes the whole-frame path");
        } else {
            info!("Face detector tiers: {}", locator.tiers().join(" -> "));
        }

        let upscaler = match config.sr_model.as_deref() {
            Some(path) => match load_upscaler(path) {
                Ok(upscaler) => {
                    info!("Super-resolution model loaded: {}", path.display());
                    Some(upscaler)
                }
                Err(e) => {
                    warn!("Super-resolution unavailable, using cubic resize: {}", e);
                    None
                }
            },
            None => None,
        };

        Self::with_capabilities(config, locator, upscaler)
    }

    /// Use the given capabilities instead of loading them from the config
    pub fn with_capabilities(
        config: RunConfig,
        locator: FaceLocator,
        upscaler: Option<Box<dyn Upscaler>>,
    ) -> Self {
        Self {
            config,
            locator,
            upscaler,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the in-memory part of the pipeline (Loaded through FinalPassed)
    pub fn process(&mut self, image: DynamicImage) -> Result<FinalPassed> {
        self.process_loaded(Loaded::new(image))
    }

    /// Decode the input, process it and write the output
    pub fn run(mut self) -> Result<RunReport> {
        debug!("{}: {:?}", PipelineStage::Start, self.config);
        let loaded = Loaded::open(&self.config.input)?;
        let finished = self.process_loaded(loaded)?;
        finished.save(&self.config.output)
    }

    fn process_loaded(&mut self, loaded: Loaded) -> Result<FinalPassed> {
        let params = self.config.params;
        let scale = self.config.scale;
        let upscaler = self.upscaler.as_deref_mut();

        let assembled = match loaded.locate(&mut self.locator) {
            Located::FaceFound(found) if self.config.face_only => {
                found.restore_region(&params, scale, upscaler).composite()?
            }
            Located::FaceFound(found) => {
                info!("Face-only mode off, restoring whole frame");
                found.restore_frame(&params, scale, upscaler).into_assembled()
            }
            Located::NoFace(none) => none.restore_frame(&params, scale, upscaler).into_assembled(),
        };

        Ok(assembled.final_pass(&params, self.config.final_pass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, NeuralFaceDetector};
    use image::Rgb;

    struct FixedDetector(Vec<Detection>);

    impl NeuralFaceDetector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        fn detect(
            &mut self,
            _image: &RgbImage,
            _threshold: f32,
        ) -> crate::detect::Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    fn portrait() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            let v = 100 + ((x * 7 + y * 5) % 30) as u8;
            Rgb([v + 20, v, v.saturating_sub(20)])
        })
    }

    fn config(face_only: bool, final_pass: bool) -> RunConfig {
        let mut config = RunConfig::new("in.png", "out.png").without_models();
        config.scale = 2;
        config.face_only = face_only;
        config.final_pass = final_pass;
        config
    }

    fn face_locator() -> FaceLocator {
        FaceLocator::default().with_neural(Box::new(FixedDetector(vec![Detection {
            confidence: 0.9,
            x1: 0.375,
            y1: 0.375,
            x2: 0.625,
            y2: 0.625,
        }])))
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::default(), PipelineStage::Start);
        assert_eq!(PipelineStage::Composited.name(), "Composited");
        assert_eq!(PipelineStage::Saved.to_string(), "Saved (output written)");
    }

    #[test]
    fn test_face_path_composites_region() {
        let mut enhancer =
            Enhancer::with_capabilities(config(true, false), face_locator(), None);
        let finished = enhancer.process(DynamicImage::ImageRgb8(portrait())).unwrap();

        assert_eq!(finished.report.path, RestorePath::FaceRegion);
        assert_eq!(finished.report.face, Some(Rect::new(24, 24, 16, 16)));
        assert_eq!(finished.report.roi, Some(Rect::new(19, 17, 26, 30)));
        assert_eq!(finished.image.dimensions(), (64, 64));
        // Outside the ROI nothing changes without a final pass
        assert_eq!(finished.image.get_pixel(2, 2), portrait().get_pixel(2, 2));
    }

    #[test]
    fn test_face_only_off_restores_whole_frame() {
        let mut enhancer =
            Enhancer::with_capabilities(config(false, false), face_locator(), None);
        let finished = enhancer.process(DynamicImage::ImageRgb8(portrait())).unwrap();
        assert_eq!(finished.report.path, RestorePath::WholeFrame);
        assert_eq!(finished.report.face, Some(Rect::new(24, 24, 16, 16)));
        assert_eq!(finished.report.roi, None);
        assert_eq!(finished.image.dimensions(), (64, 64));
    }

    #[test]
    fn test_no_face_restores_whole_frame() {
        let mut enhancer =
            Enhancer::with_capabilities(config(true, true), FaceLocator::default(), None);
        let finished = enhancer
            .process(DynamicImage::ImageRgb8(RgbImage::new(40, 30)))
            .unwrap();
        assert_eq!(finished.report.path, RestorePath::WholeFrame);
        assert_eq!(finished.report.face, None);
        assert_eq!(finished.image.dimensions(), (40, 30));
    }

    #[test]
    fn test_final_pass_gating() {
        let image = portrait();
        let mut params = ParameterSet {
            global_contrast_clip: 2.0,
            global_sharpen_amount: 0.0,
            ..ParameterSet::default()
        };

        assert_eq!(final_pass(image.clone(), &params, false), image);
        assert_ne!(final_pass(image.clone(), &params, true), image);

        params.global_contrast_clip = 0.0;
        assert_eq!(final_pass(image.clone(), &params, true), image);
    }

    #[test]
    fn test_missing_input_is_input_error() {
        let result = Loaded::open(Path::new("/nonexistent/input.jpg"));
        assert!(matches!(result, Err(EnhanceError::InputDecode { .. })));
    }
}
