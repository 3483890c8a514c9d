//! Error types and process exit codes
//!
//! Only input decoding, output encoding and compositing failures surface
//! as errors from a run. Detector and super-resolution failures are
//! handled where they happen and degrade the pipeline instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::composite::CompositeError;
use crate::config::ConfigError;

/// Process exit codes
pub mod exit_codes {
    /// Image saved
    pub const SUCCESS: i32 = 0;
    /// Malformed or missing command-line arguments
    pub const USAGE: i32 = 1;
    /// Source image could not be read or decoded
    pub const INPUT_ERROR: i32 = 2;
    /// Result could not be encoded or written
    pub const OUTPUT_ERROR: i32 = 3;
    /// Processing failed on degenerate geometry
    pub const PROCESSING_ERROR: i32 = 4;
}

/// Pipeline error types
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Failed to read input {}: {source}", path.display())]
    InputDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write output {}: {source}", path.display())]
    OutputEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Composite failed: {0}")]
    Composite(#[from] CompositeError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl EnhanceError {
    /// Exit code the binary reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            EnhanceError::InputDecode { .. } => exit_codes::INPUT_ERROR,
            EnhanceError::OutputEncode { .. } => exit_codes::OUTPUT_ERROR,
            EnhanceError::Composite(_) => exit_codes::PROCESSING_ERROR,
            EnhanceError::Config(_) => exit_codes::USAGE,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnhanceError>;
