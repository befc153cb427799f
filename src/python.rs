//! Python bindings for the voxel statistics

use crate::types::{PreprocessError, PreprocessOptions};
use crate::voxel_statistics::VoxelStatistics;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

impl From<PreprocessError> for PyErr {
    fn from(err: PreprocessError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Read-only view of a computed `VoxelStatistics` record.
#[pyclass(name = "VoxelStatistics", module = "voxstat._core", frozen)]
pub struct PyVoxelStatistics {
    inner: VoxelStatistics,
}

#[pymethods]
impl PyVoxelStatistics {
    #[getter]
    fn number_elements_f(&self) -> usize {
        self.inner.number_elements_f
    }

    #[getter]
    fn number_elements_m(&self) -> usize {
        self.inner.number_elements_m
    }

    #[getter]
    fn num_nonzero_points_f(&self) -> usize {
        self.inner.num_nonzero_points_f
    }

    #[getter]
    fn num_nonzero_points_m(&self) -> usize {
        self.inner.num_nonzero_points_m
    }

    #[getter]
    fn num_intersection(&self) -> usize {
        self.inner.num_intersection
    }

    #[getter]
    fn values_f(&self) -> Vec<f64> {
        self.inner.values_f.clone()
    }

    #[getter]
    fn values_m(&self) -> Vec<f64> {
        self.inner.values_m.clone()
    }

    #[getter]
    fn mean_f(&self) -> f64 {
        self.inner.mean_f
    }

    #[getter]
    fn mean_m(&self) -> f64 {
        self.inner.mean_m
    }

    fn fixed_voxel_count(&self) -> usize {
        self.inner.fixed_voxel_count()
    }

    fn moving_voxel_count(&self) -> usize {
        self.inner.moving_voxel_count()
    }

    fn sizes_differ(&self) -> bool {
        self.inner.sizes_differ()
    }

    fn fixed_is_empty(&self) -> bool {
        self.inner.fixed_is_empty()
    }

    fn moving_is_empty(&self) -> bool {
        self.inner.moving_is_empty()
    }

    /// Scalar statistics as a JSON document.
    fn summary_json(&self) -> PyResult<String> {
        Ok(self.inner.summary().to_json()?)
    }

    /// Scalar statistics as a two-row polars DataFrame.
    fn summary_frame(&self) -> PyResult<PyDataFrame> {
        let df = self
            .inner
            .summary_frame()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(PyDataFrame(df))
    }

    fn __repr__(&self) -> String {
        format!(
            "VoxelStatistics(fixed={}, moving={}, intersection={}, mean_f={}, mean_m={})",
            self.inner.number_elements_f,
            self.inner.number_elements_m,
            self.inner.num_intersection,
            self.inner.mean_f,
            self.inner.mean_m
        )
    }
}

/// Computes voxel statistics for two flattened volumes.
///
/// Args:
///     fixed (list[float]): Fixed volume voxels in traversal order.
///     moving (list[float]): Moving volume voxels in the same order.
///     fuzzy (bool): Clamp values into [0, 1] instead of binarizing.
///     threshold (float): Binarization cutoff, ignored when fuzzy.
///     parallel (bool): Run the passes on the rayon thread pool.
///
/// Raises:
///     ValueError: If the threshold is not finite in binary mode.
#[pyfunction]
#[pyo3(signature = (fixed, moving, fuzzy = false, threshold = 0.5, parallel = false))]
pub fn compute_voxel_statistics(
    py: Python<'_>,
    fixed: Vec<f64>,
    moving: Vec<f64>,
    fuzzy: bool,
    threshold: f64,
    parallel: bool,
) -> PyResult<PyVoxelStatistics> {
    let options = PreprocessOptions::builder()
        .fuzzy(fuzzy)
        .threshold(threshold)
        .parallel(parallel)
        .build();

    let inner = py.allow_threads(|| VoxelStatistics::compute(&fixed, &moving, &options))?;
    Ok(PyVoxelStatistics { inner })
}
