use crate::types::VoxelSource;

/// Totals gathered by a single count pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VoxelCounts {
    pub total: usize,
    pub nonzero: usize,
}

/// Output of a normalization pass over one volume.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVolume {
    pub values: Vec<f64>,
    pub sum: f64,
    /// Only ever cleared by the fuzzy branch.
    pub empty: bool,
}

/// Counts every enumerated voxel and the voxels whose raw value is nonzero.
pub fn count_voxels<V>(volume: &V) -> VoxelCounts
where
    V: VoxelSource + ?Sized,
{
    volume
        .voxels()
        .fold(VoxelCounts::default(), |mut counts, value| {
            counts.total += 1;
            if value != 0.0 {
                counts.nonzero += 1;
            }
            counts
        })
}

/// Counts positions where both raw values are nonzero.
///
/// The volumes are walked in lock-step and the walk stops at the end of the
/// shorter one, so only the common prefix is compared.
pub fn count_intersection<F, M>(fixed: &F, moving: &M) -> usize
where
    F: VoxelSource + ?Sized,
    M: VoxelSource + ?Sized,
{
    fixed
        .voxels()
        .zip(moving.voxels())
        .filter(|&(f, m)| f != 0.0 && m != 0.0)
        .count()
}

/// Clamps a raw membership into `[0, 1]`. NaN passes through unchanged.
pub fn fuzzy_value(raw: f64) -> f64 {
    if raw > 1.0 {
        1.0
    } else if raw < 0.0 {
        0.0
    } else {
        raw
    }
}

/// Maps a raw value to `{0, 1}`; the threshold itself maps to 1.
pub fn binary_value(raw: f64, threshold: f64) -> f64 {
    if raw < threshold { 0.0 } else { 1.0 }
}

/// Normalizes one volume, keeping the raw-value emptiness check ahead of
/// the clamp.
pub fn normalize_fuzzy<V>(volume: &V) -> NormalizedVolume
where
    V: VoxelSource + ?Sized,
{
    let mut values = Vec::with_capacity(volume.len());
    let mut sum = 0.0;
    let mut empty = true;

    for raw in volume.voxels() {
        if raw != 0.0 {
            empty = false;
        }
        let value = fuzzy_value(raw);
        sum += value;
        values.push(value);
    }

    NormalizedVolume { values, sum, empty }
}

/// Binarizes one volume. `empty` is left at `true` whatever the content.
pub fn binarize<V>(volume: &V, threshold: f64) -> NormalizedVolume
where
    V: VoxelSource + ?Sized,
{
    let mut values = Vec::with_capacity(volume.len());
    let mut sum = 0.0;

    for raw in volume.voxels() {
        let value = binary_value(raw, threshold);
        sum += value;
        values.push(value);
    }

    NormalizedVolume {
        values,
        sum,
        empty: true,
    }
}

pub fn normalize<V>(volume: &V, fuzzy: bool, threshold: f64) -> NormalizedVolume
where
    V: VoxelSource + ?Sized,
{
    if fuzzy {
        normalize_fuzzy(volume)
    } else {
        binarize(volume, threshold)
    }
}
