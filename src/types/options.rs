//! Processing parameters for a preprocessing run

use crate::types::error::PreprocessError;
use bon::Builder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Parameters controlling how voxel values are normalized.
///
/// `threshold` is only consulted when `fuzzy` is false.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Keep graded memberships clamped to `[0, 1]` instead of binarizing.
    #[builder(default)]
    pub fuzzy: bool,
    /// Binarization cutoff; values strictly below it map to 0.
    #[builder(default = DEFAULT_THRESHOLD)]
    pub threshold: f64,
    /// Run the independent passes on the rayon pool.
    #[builder(default)]
    pub parallel: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            fuzzy: false,
            threshold: DEFAULT_THRESHOLD,
            parallel: false,
        }
    }
}

impl PreprocessOptions {
    pub fn fuzzy() -> Self {
        Self {
            fuzzy: true,
            ..Self::default()
        }
    }

    pub fn binary(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Parse options from a JSON object. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PreprocessError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String, PreprocessError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject a NaN threshold in binary mode. Infinite thresholds are valid
    /// cutoffs: `+inf` maps every voxel to 0 and `-inf` maps every voxel to 1.
    pub fn validate(&self) -> Result<(), PreprocessError> {
        if !self.fuzzy && self.threshold.is_nan() {
            return Err(PreprocessError::InvalidArgument {
                name: "threshold",
                reason: "must not be NaN in binary mode".to_string(),
            });
        }
        Ok(())
    }
}
