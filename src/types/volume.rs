//! Volume abstractions consumed by the voxel passes

use crate::types::error::PreprocessError;
use bon::bon;
use ndarray::{Array3, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

/// A read-only source of voxel intensities.
///
/// Implementors must yield the same values in the same order every time
/// `voxels` is called. The fixed and moving volumes of one comparison are
/// walked in lock-step, so they must also share a traversal order.
pub trait VoxelSource {
    /// Number of voxels the source holds.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate the raw voxel values.
    fn voxels(&self) -> impl Iterator<Item = f64> + '_;
}

impl VoxelSource for [f64] {
    fn len(&self) -> usize {
        <[f64]>::len(self)
    }

    fn voxels(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().copied()
    }
}

impl VoxelSource for Vec<f64> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn voxels(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().copied()
    }
}

/// Any ndarray with `f64` elements, enumerated in logical (row-major) order
/// regardless of its memory layout.
impl<S, D> VoxelSource for ArrayBase<S, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn len(&self) -> usize {
        ArrayBase::len(self)
    }

    fn voxels(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().copied()
    }
}

/// An owned 3D scalar grid.
///
/// The shape is `[d0, d1, d2]`; flat buffers are interpreted in row-major
/// order, the last axis varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    data: Array3<f64>,
}

#[bon]
impl Volume {
    /// Build a volume from a flat voxel buffer.
    ///
    /// # Errors
    /// `PreprocessError::InvalidShape` if `data.len()` is not the product of
    /// the three dimensions.
    #[builder]
    pub fn new(shape: [usize; 3], data: Vec<f64>) -> Result<Self, PreprocessError> {
        Self::from_shape_vec(shape, data)
    }

    pub fn from_shape_vec(shape: [usize; 3], data: Vec<f64>) -> Result<Self, PreprocessError> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(PreprocessError::InvalidShape {
                shape,
                expected,
                actual: data.len(),
            });
        }

        let actual = data.len();
        let data = Array3::from_shape_vec((shape[0], shape[1], shape[2]), data).map_err(|_| {
            PreprocessError::InvalidShape {
                shape,
                expected,
                actual,
            }
        })?;

        Ok(Self { data })
    }

    /// A volume of the given shape with every voxel set to zero.
    pub fn zeros(shape: [usize; 3]) -> Self {
        Self {
            data: Array3::zeros((shape[0], shape[1], shape[2])),
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        let dims = self.data.dim();
        [dims.0, dims.1, dims.2]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }
}

impl From<Array3<f64>> for Volume {
    fn from(data: Array3<f64>) -> Self {
        Self { data }
    }
}

impl VoxelSource for Volume {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn voxels(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }
}
