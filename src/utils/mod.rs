//! Helpers for reporting and numeric edge cases

pub mod misc;
pub mod summary_frame;

// Re-export commonly used utility functions for convenience
pub use misc::*;
pub use summary_frame::{non_empty_volumes, to_dataframe};
