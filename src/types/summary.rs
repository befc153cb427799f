//! Serializable report of a finished preprocessing run

use crate::types::error::PreprocessError;
use serde::{Deserialize, Serialize};

/// Scalar statistics of one volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub voxel_count: usize,
    pub nonzero_count: usize,
    pub mean: f64,
    pub empty: bool,
}

/// Scalar statistics of a fixed/moving pair, without the value arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub fixed: VolumeSummary,
    pub moving: VolumeSummary,
    pub intersection: usize,
    pub sizes_differ: bool,
}

impl StatisticsSummary {
    pub fn to_json(&self) -> Result<String, PreprocessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Iterate the per-volume entries labelled by role.
    pub fn volumes(&self) -> [(&'static str, &VolumeSummary); 2] {
        [("fixed", &self.fixed), ("moving", &self.moving)]
    }
}
