//! Configuration file support and run configuration
//!
//! # Layering
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config <path>`, else `./face-enhance.toml`,
//!    else `<user config dir>/face-enhance/config.toml`)
//! 3. Command-line flags
//!
//! # Example
//!
//! ```toml
//! sr_model = "models/ESPCN_x4.onnx"
//! detector_weights = "models/opencv_face_detector.onnx"
//! cascade = "models/seeta_fd_frontal_v1.0.bin"
//! scale = 4
//! confidence = 0.6
//! face_only = true
//! final_pass = true
//!
//! [params]
//! local_contrast_clip = 1.5
//! global_sharpen_amount = 0.2
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detect::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::params::{select, ParameterOverrides, ParameterSet, MIN_GAMMA};

// ============================================================
// Constants
// ============================================================

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "face-enhance.toml";

/// Directory under the user config dir
pub const CONFIG_DIR_NAME: &str = "face-enhance";

/// Default super-resolution model
pub const DEFAULT_SR_MODEL: &str = "models/EDSR_x4.onnx";

/// Default neural detector weights
pub const DEFAULT_DETECTOR_WEIGHTS: &str = "models/opencv_face_detector.onnx";

/// Default upscale factor
pub const DEFAULT_SCALE: u32 = 4;

/// Smallest accepted upscale factor
pub const MIN_SCALE: u32 = 2;

/// Largest accepted upscale factor
pub const MAX_SCALE: u32 = 8;

// ============================================================
// Error Types
// ============================================================

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// Config File
// ============================================================

/// Contents of a config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sr_model: Option<PathBuf>,
    pub detector_proto: Option<PathBuf>,
    pub detector_weights: Option<PathBuf>,
    pub cascade: Option<PathBuf>,
    pub scale: Option<u32>,
    pub confidence: Option<f32>,
    pub face_only: Option<bool>,
    pub final_pass: Option<bool>,
    pub params: ParameterOverrides,
}

impl Config {
    /// Load from the default locations. No file found is not an error.
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::load_from_path(&local);
        }

        if let Some(user) = Self::user_config_path() {
            if user.is_file() {
                return Self::load_from_path(&user);
            }
        }

        Ok(Self::default())
    }

    /// Load a specific config file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `<user config dir>/face-enhance/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Layer command-line values over this config and resolve the run
    /// configuration. Command-line values win.
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> RunConfig {
        let overrides = sanitize_overrides(self.params.merged_with(&cli.params));

        RunConfig {
            input: cli.input.clone(),
            output: cli.output.clone(),
            sr_model: cli
                .sr_model
                .clone()
                .or_else(|| self.sr_model.clone())
                .or_else(|| Some(PathBuf::from(DEFAULT_SR_MODEL))),
            detector_proto: cli
                .detector_proto
                .clone()
                .or_else(|| self.detector_proto.clone()),
            detector_weights: cli
                .detector_weights
                .clone()
                .or_else(|| self.detector_weights.clone())
                .or_else(|| Some(PathBuf::from(DEFAULT_DETECTOR_WEIGHTS))),
            cascade: cli.cascade.clone().or_else(|| self.cascade.clone()),
            scale: clamp_scale(cli.scale.or(self.scale).unwrap_or(DEFAULT_SCALE)),
            confidence: clamp_confidence(
                cli.confidence
                    .or(self.confidence)
                    .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            ),
            face_only: cli.face_only.or(self.face_only).unwrap_or(true),
            final_pass: cli.final_pass.or(self.final_pass).unwrap_or(true),
            params: select(&overrides),
        }
    }
}

// ============================================================
// CLI Overrides
// ============================================================

/// Values taken from the command line; `None` defers to the config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sr_model: Option<PathBuf>,
    pub detector_proto: Option<PathBuf>,
    pub detector_weights: Option<PathBuf>,
    pub cascade: Option<PathBuf>,
    pub scale: Option<u32>,
    pub confidence: Option<f32>,
    pub face_only: Option<bool>,
    pub final_pass: Option<bool>,
    pub params: ParameterOverrides,
}

impl CliOverrides {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Default::default()
        }
    }
}

// ============================================================
// Run Configuration
// ============================================================

/// Fully resolved, read-only configuration of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Super-resolution model; `None` always uses cubic resize
    pub sr_model: Option<PathBuf>,
    /// Neural detector companion file, checked for existence
    pub detector_proto: Option<PathBuf>,
    /// Neural detector weights; `None` disables the neural tier
    pub detector_weights: Option<PathBuf>,
    /// Cascade model; `None` disables the cascade tier
    pub cascade: Option<PathBuf>,
    /// Upscale factor in `[2, 8]`
    pub scale: u32,
    /// Neural detection threshold in `[0, 1]`
    pub confidence: f32,
    /// Restore only the face region when one is found
    pub face_only: bool,
    /// Run the global contrast/sharpen pass after compositing
    pub final_pass: bool,
    pub params: ParameterSet,
}

impl RunConfig {
    /// Defaults for the given paths, with no config file and no flags
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Config::default().merge_with_cli(&CliOverrides::new(input, output))
    }

    /// Drop every model so the run uses only built-in fallbacks
    #[must_use]
    pub fn without_models(mut self) -> Self {
        self.sr_model = None;
        self.detector_proto = None;
        self.detector_weights = None;
        self.cascade = None;
        self
    }
}

fn clamp_scale(scale: u32) -> u32 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        DEFAULT_CONFIDENCE_THRESHOLD
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Floor contrast/sharpen values at zero and gamma at [`MIN_GAMMA`]
fn sanitize_overrides(mut overrides: ParameterOverrides) -> ParameterOverrides {
    let floor = |v: Option<f64>, min: f64| v.map(|v| v.max(min));
    overrides.local_contrast_clip = floor(overrides.local_contrast_clip, 0.0);
    overrides.global_contrast_clip = floor(overrides.global_contrast_clip, 0.0);
    overrides.local_sharpen_amount = floor(overrides.local_sharpen_amount, 0.0);
    overrides.global_sharpen_amount = floor(overrides.global_sharpen_amount, 0.0);
    overrides.gamma = floor(overrides.gamma, MIN_GAMMA);
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let run = RunConfig::new("in.jpg", "out.png");
        assert_eq!(run.input, PathBuf::from("in.jpg"));
        assert_eq!(run.sr_model, Some(PathBuf::from(DEFAULT_SR_MODEL)));
        assert_eq!(run.detector_weights, Some(PathBuf::from(DEFAULT_DETECTOR_WEIGHTS)));
        assert_eq!(run.detector_proto, None);
        assert_eq!(run.cascade, None);
        assert_eq!(run.scale, 4);
        assert_eq!(run.confidence, 0.5);
        assert!(run.face_only);
        assert!(run.final_pass);
        assert_eq!(run.params, ParameterSet::default());
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut cli = CliOverrides::new("a", "b");
        cli.scale = Some(10);
        assert_eq!(Config::default().merge_with_cli(&cli).scale, 8);

        cli.scale = Some(1);
        assert_eq!(Config::default().merge_with_cli(&cli).scale, 2);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut cli = CliOverrides::new("a", "b");
        cli.confidence = Some(1.7);
        assert_eq!(Config::default().merge_with_cli(&cli).confidence, 1.0);
        cli.confidence = Some(-0.3);
        assert_eq!(Config::default().merge_with_cli(&cli).confidence, 0.0);
    }

    #[test]
    fn test_parameter_values_are_floored() {
        let mut cli = CliOverrides::new("a", "b");
        cli.params.local_contrast_clip = Some(-2.0);
        cli.params.gamma = Some(0.01);
        let run = Config::default().merge_with_cli(&cli);
        assert_eq!(run.params.local_contrast_clip, 0.0);
        assert_eq!(run.params.gamma, MIN_GAMMA);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let config = Config::from_toml(
            r#"
            scale = 3
            cascade = "file.bin"
            final_pass = false

            [params]
            gamma = 1.3
            local_contrast_clip = 2.0
            "#,
        )
        .unwrap();

        let mut cli = CliOverrides::new("a", "b");
        cli.scale = Some(6);
        cli.params.gamma = Some(0.9);

        let run = config.merge_with_cli(&cli);
        assert_eq!(run.scale, 6);
        assert_eq!(run.cascade, Some(PathBuf::from("file.bin")));
        assert!(!run.final_pass);
        assert_eq!(run.params.gamma, 0.9);
        assert_eq!(run.params.local_contrast_clip, 2.0);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_toml("sclae = 4").is_err());
        assert!(Config::from_toml("[params]\nclip = 1.0").is_err());
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "confidence = 0.7\nface_only = false").unwrap();

        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.confidence, Some(0.7));
        assert_eq!(config.face_only, Some(false));
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load_from_path(Path::new("/nonexistent/face-enhance.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scale = \"big\"").unwrap();
        assert!(matches!(
            Config::load_from_path(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_without_models() {
        let run = RunConfig::new("a", "b").without_models();
        assert!(run.sr_model.is_none());
        assert!(run.detector_weights.is_none());
    }
}
