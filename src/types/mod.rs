//! Type definitions shared across the preprocessing passes

pub mod error;
pub mod options;
pub mod summary;
pub mod volume;

// Re-export the main types for convenience
pub use error::PreprocessError;
pub use options::PreprocessOptions;
pub use summary::{StatisticsSummary, VolumeSummary};
pub use volume::{Volume, VoxelSource};
