//! face-enhance - Face-aware single image enhancement
//!
//! Locates the principal face, upsamples and restores it with a
//! natural-look filter chain, and blends it back into the original frame
//! without visible seams. Without a face the whole frame is restored.
//!
//! # Modules
//!
//! - [`normalize`] - Canonical 8-bit RGB layout
//! - [`detect`] - Two-tier face locator (neural, then cascade)
//! - [`params`] - Tunable parameter set
//! - [`region`] - Padded region of interest
//! - [`upscale`] - Super-resolution with cubic fallback
//! - [`filters`] - Gamma, bilateral, detail, CLAHE, unsharp
//! - [`restore`] - Restoration chain
//! - [`composite`] - Feather mask and seamless blend
//! - [`pipeline`] - State machine and [`Enhancer`]
//! - [`config`] / [`cli`] - Configuration layering and flags
//!
//! # Example
//!
//! ```rust,no_run
//! use face_enhance::{Enhancer, RunConfig};
//!
//! let mut config = RunConfig::new("in.jpg", "out.png");
//! config.scale = 2;
//! let report = Enhancer::new(config).run()?;
//! println!("{:?}", report.path);
//! # Ok::<(), face_enhance::EnhanceError>(())
//! ```

pub mod cli;
pub mod composite;
pub mod config;
pub mod detect;
pub mod error;
pub mod filters;
pub mod normalize;
pub mod params;
pub mod pipeline;
pub mod region;
pub mod restore;
pub mod upscale;

// Re-exports
pub use cli::Cli;
pub use composite::{composite, CompositeError};
pub use config::{CliOverrides, Config, ConfigError, RunConfig};
pub use detect::{DetectError, FaceLocator};
pub use error::{exit_codes, EnhanceError, Result};
pub use normalize::{normalize, normalize_owned};
pub use params::{select, ParameterOverrides, ParameterSet};
pub use pipeline::{final_pass, Enhancer, FinalPassed, PipelineStage, RestorePath, RunReport};
pub use region::{extract_region, Rect, Region};
pub use restore::{restore, RestoreMode};
pub use upscale::{UpscaleError, Upscaler};
