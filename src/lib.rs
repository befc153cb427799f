//! Per-volume voxel statistics for fixed/moving image pairs.
//!
//! `VoxelStatistics` counts voxels, nonzero voxels and their overlap, and
//! normalizes every voxel either by clamping (fuzzy mode) or by
//! thresholding (binary mode). Overlap and similarity metrics are built on
//! top of these numbers.

pub mod processing;
#[cfg(feature = "python")]
pub mod python;
pub mod types;
pub mod utils;
pub mod voxel_statistics;

pub use types::{
    PreprocessError, PreprocessOptions, StatisticsSummary, Volume, VolumeSummary, VoxelSource,
};
pub use voxel_statistics::VoxelStatistics;

#[cfg(feature = "python")]
use pyo3::{Bound, PyResult, pymodule, types::PyModule, types::PyModuleMethods, wrap_pyfunction};

/// The Python extension module. Its name must match the module name the
/// package is built under, else Python will not be able to import it.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyVoxelStatistics>()?;
    m.add_function(wrap_pyfunction!(python::compute_voxel_statistics, m)?)?;
    Ok(())
}
