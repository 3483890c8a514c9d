//! Restoration parameter selection
//!
//! A fixed natural-look parameter table, optionally overridden field by
//! field from the config file or command line.

use serde::Deserialize;

// ============================================================
// Constants
// ============================================================

/// Default CLAHE clip limit for the restored region
const DEFAULT_LOCAL_CONTRAST_CLIP: f64 = 1.2;

/// Default CLAHE clip limit for the final pass (disabled)
const DEFAULT_GLOBAL_CONTRAST_CLIP: f64 = 0.0;

/// Default unsharp amount for the restored region
const DEFAULT_LOCAL_SHARPEN_AMOUNT: f64 = 0.35;

/// Default unsharp amount for the final pass
const DEFAULT_GLOBAL_SHARPEN_AMOUNT: f64 = 0.15;

/// Default gamma (identity)
const DEFAULT_GAMMA: f64 = 1.0;

/// Default bilateral filter diameter in pixels
const DEFAULT_BILATERAL_DIAMETER: u32 = 7;

/// Default bilateral color sigma
const DEFAULT_BILATERAL_COLOR_SIGMA: f64 = 55.0;

/// Default bilateral spatial sigma
const DEFAULT_BILATERAL_SPACE_SIGMA: f64 = 55.0;

/// Default detail-enhance spatial sigma
const DEFAULT_DETAIL_SIGMA_SPACE: f32 = 8.0;

/// Default detail-enhance range sigma
const DEFAULT_DETAIL_SIGMA_RANGE: f32 = 0.08;

/// Smallest accepted gamma
pub const MIN_GAMMA: f64 = 0.1;

/// Largest accepted detail-enhance spatial sigma
pub const MAX_DETAIL_SIGMA_SPACE: f32 = 200.0;

/// Largest accepted detail-enhance range sigma
pub const MAX_DETAIL_SIGMA_RANGE: f32 = 1.0;

// ============================================================
// Parameter Set
// ============================================================

/// Tuned parameters for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    /// CLAHE clip limit inside the restoration chain (<= 0 disables)
    pub local_contrast_clip: f64,
    /// CLAHE clip limit for the final pass (<= 0 disables)
    pub global_contrast_clip: f64,
    /// Unsharp amount inside the restoration chain
    pub local_sharpen_amount: f64,
    /// Unsharp amount for the final pass (<= 0 disables)
    pub global_sharpen_amount: f64,
    /// Power-law gamma
    pub gamma: f64,
    /// Bilateral filter diameter
    pub bilateral_diameter: u32,
    /// Bilateral color sigma
    pub bilateral_color_sigma: f64,
    /// Bilateral spatial sigma
    pub bilateral_space_sigma: f64,
    /// Detail-enhance spatial sigma
    pub detail_sigma_space: f32,
    /// Detail-enhance range sigma
    pub detail_sigma_range: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            local_contrast_clip: DEFAULT_LOCAL_CONTRAST_CLIP,
            global_contrast_clip: DEFAULT_GLOBAL_CONTRAST_CLIP,
            local_sharpen_amount: DEFAULT_LOCAL_SHARPEN_AMOUNT,
            global_sharpen_amount: DEFAULT_GLOBAL_SHARPEN_AMOUNT,
            gamma: DEFAULT_GAMMA,
            bilateral_diameter: DEFAULT_BILATERAL_DIAMETER,
            bilateral_color_sigma: DEFAULT_BILATERAL_COLOR_SIGMA,
            bilateral_space_sigma: DEFAULT_BILATERAL_SPACE_SIGMA,
            detail_sigma_space: DEFAULT_DETAIL_SIGMA_SPACE,
            detail_sigma_range: DEFAULT_DETAIL_SIGMA_RANGE,
        }
    }
}

/// Optional per-field overrides
///
/// Deserialized from the `[params]` table of the config file; the
/// contrast, sharpening and gamma fields are also settable from flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterOverrides {
    pub local_contrast_clip: Option<f64>,
    pub global_contrast_clip: Option<f64>,
    pub local_sharpen_amount: Option<f64>,
    pub global_sharpen_amount: Option<f64>,
    pub gamma: Option<f64>,
    pub bilateral_diameter: Option<u32>,
    pub bilateral_color_sigma: Option<f64>,
    pub bilateral_space_sigma: Option<f64>,
    pub detail_sigma_space: Option<f32>,
    pub detail_sigma_range: Option<f32>,
}

impl ParameterOverrides {
    /// Layer `other` on top of `self`; fields set in `other` win
    #[must_use]
    pub fn merged_with(self, other: &ParameterOverrides) -> Self {
        Self {
            local_contrast_clip: other.local_contrast_clip.or(self.local_contrast_clip),
            global_contrast_clip: other.global_contrast_clip.or(self.global_contrast_clip),
            local_sharpen_amount: other.local_sharpen_amount.or(self.local_sharpen_amount),
            global_sharpen_amount: other.global_sharpen_amount.or(self.global_sharpen_amount),
            gamma: other.gamma.or(self.gamma),
            bilateral_diameter: other.bilateral_diameter.or(self.bilateral_diameter),
            bilateral_color_sigma: other.bilateral_color_sigma.or(self.bilateral_color_sigma),
            bilateral_space_sigma: other.bilateral_space_sigma.or(self.bilateral_space_sigma),
            detail_sigma_space: other.detail_sigma_space.or(self.detail_sigma_space),
            detail_sigma_range: other.detail_sigma_range.or(self.detail_sigma_range),
        }
    }
}

/// Build the parameter set from defaults and overrides.
///
/// An override replaces the default only when it is valid: finite and
/// non-negative for amounts and sigmas, at least [`MIN_GAMMA`] for gamma,
/// positive and within bounds for the detail-enhance sigmas. Invalid
/// overrides are ignored.
pub fn select(overrides: &ParameterOverrides) -> ParameterSet {
    let defaults = ParameterSet::default();

    ParameterSet {
        local_contrast_clip: non_negative(overrides.local_contrast_clip)
            .unwrap_or(defaults.local_contrast_clip),
        global_contrast_clip: non_negative(overrides.global_contrast_clip)
            .unwrap_or(defaults.global_contrast_clip),
        local_sharpen_amount: non_negative(overrides.local_sharpen_amount)
            .unwrap_or(defaults.local_sharpen_amount),
        global_sharpen_amount: non_negative(overrides.global_sharpen_amount)
            .unwrap_or(defaults.global_sharpen_amount),
        gamma: overrides
            .gamma
            .filter(|g| g.is_finite() && *g >= MIN_GAMMA)
            .unwrap_or(defaults.gamma),
        bilateral_diameter: overrides
            .bilateral_diameter
            .unwrap_or(defaults.bilateral_diameter),
        bilateral_color_sigma: non_negative(overrides.bilateral_color_sigma)
            .unwrap_or(defaults.bilateral_color_sigma),
        bilateral_space_sigma: non_negative(overrides.bilateral_space_sigma)
            .unwrap_or(defaults.bilateral_space_sigma),
        detail_sigma_space: overrides
            .detail_sigma_space
            .filter(|s| s.is_finite() && *s > 0.0 && *s <= MAX_DETAIL_SIGMA_SPACE)
            .unwrap_or(defaults.detail_sigma_space),
        detail_sigma_range: overrides
            .detail_sigma_range
            .filter(|s| s.is_finite() && *s > 0.0 && *s <= MAX_DETAIL_SIGMA_RANGE)
            .unwrap_or(defaults.detail_sigma_range),
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}
