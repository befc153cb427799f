//! The independent linear scans behind `VoxelStatistics`

pub mod passes;

// Re-export for easier access
pub use passes::*;
