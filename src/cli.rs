//! Command-line interface
//!
//! Flags left unset defer to the config file, then to built-in defaults.

use clap::Parser;
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::params::ParameterOverrides;

/// Face-aware single image enhancement
#[derive(Debug, Parser)]
#[command(name = "face-enhance")]
#[command(version, about = "Face-aware image enhancement with seamless compositing", long_about = None)]
pub struct Cli {
    /// Input image
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output image (format from extension)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Super-resolution model [default: models/EDSR_x4.onnx]
    #[arg(long, value_name = "MODEL")]
    pub sr: Option<PathBuf>,

    /// Upscale factor, clamped to 2..8 [default: 4]
    #[arg(long, value_name = "INT")]
    pub scale: Option<u32>,

    /// Neural detector companion file; must exist when given
    #[arg(long, value_name = "PATH")]
    pub proto: Option<PathBuf>,

    /// Neural detector weights [default: models/opencv_face_detector.onnx]
    #[arg(long, value_name = "PATH")]
    pub weights: Option<PathBuf>,

    /// Cascade detector model (fallback tier)
    #[arg(long, value_name = "PATH")]
    pub cascade: Option<PathBuf>,

    /// Local contrast clip limit (0 disables)
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub clip: Option<f64>,

    /// Final-pass contrast clip limit (0 disables)
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub gclip: Option<f64>,

    /// Local sharpen amount
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub sharp: Option<f64>,

    /// Final-pass sharpen amount (0 disables)
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub gsharp: Option<f64>,

    /// Gamma, at least 0.1
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub gamma: Option<f64>,

    /// Detection confidence threshold, 0..1 [default: 0.5]
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub conf: Option<f32>,

    /// Restore the whole frame even when a face is found
    #[arg(long)]
    pub no_face_only: bool,

    /// Skip the final global contrast/sharpen pass
    #[arg(long)]
    pub no_final: bool,

    /// Config file [default: ./face-enhance.toml or the user config dir]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the resolved configuration and exit without processing
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Flags as config overrides; unset flags stay `None`
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            input: self.input.clone(),
            output: self.output.clone(),
            sr_model: self.sr.clone(),
            detector_proto: self.proto.clone(),
            detector_weights: self.weights.clone(),
            cascade: self.cascade.clone(),
            scale: self.scale,
            confidence: self.conf,
            face_only: self.no_face_only.then_some(false),
            final_pass: self.no_final.then_some(false),
            params: ParameterOverrides {
                local_contrast_clip: self.clip,
                global_contrast_clip: self.gclip,
                local_sharpen_amount: self.sharp,
                global_sharpen_amount: self.gsharp,
                gamma: self.gamma,
                ..Default::default()
            },
        }
    }
}
