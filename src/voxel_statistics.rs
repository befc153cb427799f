use crate::processing::{self, NormalizedVolume, VoxelCounts};
use crate::types::{PreprocessError, PreprocessOptions, StatisticsSummary, VolumeSummary, VoxelSource};
use crate::utils::{guarded_mean, summary_frame};
use log::{debug, warn};
use polars::prelude::{DataFrame, PolarsError};

/// Voxel counts, normalized values and means for a fixed/moving volume pair.
///
/// Everything is computed eagerly by the constructors and is read-only
/// afterwards. The input volumes are only borrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelStatistics {
    pub number_elements_f: usize,
    pub number_elements_m: usize,
    pub num_nonzero_points_f: usize,
    pub num_nonzero_points_m: usize,
    /// Positions where both raw values are nonzero, over the common prefix.
    pub num_intersection: usize,
    pub values_f: Vec<f64>,
    pub values_m: Vec<f64>,
    pub mean_f: f64,
    pub mean_m: f64,
    empty_f: bool,
    empty_m: bool,
}

impl VoxelStatistics {
    /// Compute the statistics of a pair sequentially.
    ///
    /// # Arguments
    /// * `fixed` - The reference volume
    /// * `moving` - The volume compared against it, in the same traversal order
    /// * `fuzzy` - Clamp values into `[0, 1]` instead of binarizing
    /// * `threshold` - Binarization cutoff, ignored in fuzzy mode
    pub fn new<F, M>(
        fixed: &F,
        moving: &M,
        fuzzy: bool,
        threshold: f64,
    ) -> Result<Self, PreprocessError>
    where
        F: VoxelSource + ?Sized,
        M: VoxelSource + ?Sized,
    {
        let options = PreprocessOptions::builder()
            .fuzzy(fuzzy)
            .threshold(threshold)
            .build();
        options.validate()?;
        Ok(Self::sequential(fixed, moving, &options))
    }

    /// Compute the statistics of a pair, honouring `options.parallel`.
    ///
    /// The volumes must be `Sync` because the execution mode is only known
    /// at runtime. Sources that are not `Sync` go through
    /// [`VoxelStatistics::compute_sequential`].
    pub fn compute<F, M>(
        fixed: &F,
        moving: &M,
        options: &PreprocessOptions,
    ) -> Result<Self, PreprocessError>
    where
        F: VoxelSource + Sync + ?Sized,
        M: VoxelSource + Sync + ?Sized,
    {
        options.validate()?;
        if options.parallel {
            Ok(Self::parallel(fixed, moving, options))
        } else {
            Ok(Self::sequential(fixed, moving, options))
        }
    }

    /// Compute the statistics on the calling thread, ignoring `options.parallel`.
    pub fn compute_sequential<F, M>(
        fixed: &F,
        moving: &M,
        options: &PreprocessOptions,
    ) -> Result<Self, PreprocessError>
    where
        F: VoxelSource + ?Sized,
        M: VoxelSource + ?Sized,
    {
        options.validate()?;
        Ok(Self::sequential(fixed, moving, options))
    }

    /// Compute the statistics with each pass running as its own rayon task.
    ///
    /// The result is bit-identical to the sequential computation.
    pub fn compute_parallel<F, M>(
        fixed: &F,
        moving: &M,
        fuzzy: bool,
        threshold: f64,
    ) -> Result<Self, PreprocessError>
    where
        F: VoxelSource + Sync + ?Sized,
        M: VoxelSource + Sync + ?Sized,
    {
        let options = PreprocessOptions::builder()
            .fuzzy(fuzzy)
            .threshold(threshold)
            .parallel(true)
            .build();
        Self::compute(fixed, moving, &options)
    }

    fn sequential<F, M>(fixed: &F, moving: &M, options: &PreprocessOptions) -> Self
    where
        F: VoxelSource + ?Sized,
        M: VoxelSource + ?Sized,
    {
        let counts_f = processing::count_voxels(fixed);
        let counts_m = processing::count_voxels(moving);
        let intersection = processing::count_intersection(fixed, moving);
        let normalized_f = processing::normalize(fixed, options.fuzzy, options.threshold);
        let normalized_m = processing::normalize(moving, options.fuzzy, options.threshold);

        Self::assemble(counts_f, counts_m, intersection, normalized_f, normalized_m)
    }

    fn parallel<F, M>(fixed: &F, moving: &M, options: &PreprocessOptions) -> Self
    where
        F: VoxelSource + Sync + ?Sized,
        M: VoxelSource + Sync + ?Sized,
    {
        let (fuzzy, threshold) = (options.fuzzy, options.threshold);

        let ((counts_f, counts_m), (intersection, (normalized_f, normalized_m))) = rayon::join(
            || {
                rayon::join(
                    || processing::count_voxels(fixed),
                    || processing::count_voxels(moving),
                )
            },
            || {
                rayon::join(
                    || processing::count_intersection(fixed, moving),
                    || {
                        rayon::join(
                            || processing::normalize(fixed, fuzzy, threshold),
                            || processing::normalize(moving, fuzzy, threshold),
                        )
                    },
                )
            },
        );

        Self::assemble(counts_f, counts_m, intersection, normalized_f, normalized_m)
    }

    fn assemble(
        counts_f: VoxelCounts,
        counts_m: VoxelCounts,
        num_intersection: usize,
        normalized_f: NormalizedVolume,
        normalized_m: NormalizedVolume,
    ) -> Self {
        if counts_f.total != counts_m.total {
            warn!(
                "volume sizes differ (fixed {}, moving {}); intersection covers the first {} voxels",
                counts_f.total,
                counts_m.total,
                counts_f.total.min(counts_m.total)
            );
        }

        let stats = Self {
            number_elements_f: counts_f.total,
            number_elements_m: counts_m.total,
            num_nonzero_points_f: counts_f.nonzero,
            num_nonzero_points_m: counts_m.nonzero,
            num_intersection,
            mean_f: guarded_mean(normalized_f.sum, counts_f.total, "fixed"),
            mean_m: guarded_mean(normalized_m.sum, counts_m.total, "moving"),
            values_f: normalized_f.values,
            values_m: normalized_m.values,
            empty_f: normalized_f.empty,
            empty_m: normalized_m.empty,
        };

        debug!(
            "voxel statistics: fixed {}/{} nonzero (mean {:.6}), moving {}/{} nonzero (mean {:.6}), intersection {}",
            stats.num_nonzero_points_f,
            stats.number_elements_f,
            stats.mean_f,
            stats.num_nonzero_points_m,
            stats.number_elements_m,
            stats.mean_m,
            stats.num_intersection
        );

        stats
    }

    pub fn fixed_voxel_count(&self) -> usize {
        self.number_elements_f
    }

    pub fn moving_voxel_count(&self) -> usize {
        self.number_elements_m
    }

    pub fn sizes_differ(&self) -> bool {
        self.number_elements_f != self.number_elements_m
    }

    /// True when every fixed voxel was zero.
    ///
    /// Only fuzzy runs ever clear this flag; binary runs always report `true`.
    pub fn fixed_is_empty(&self) -> bool {
        self.empty_f
    }

    /// See [`VoxelStatistics::fixed_is_empty`].
    pub fn moving_is_empty(&self) -> bool {
        self.empty_m
    }

    pub fn summary(&self) -> StatisticsSummary {
        StatisticsSummary {
            fixed: VolumeSummary {
                voxel_count: self.number_elements_f,
                nonzero_count: self.num_nonzero_points_f,
                mean: self.mean_f,
                empty: self.empty_f,
            },
            moving: VolumeSummary {
                voxel_count: self.number_elements_m,
                nonzero_count: self.num_nonzero_points_m,
                mean: self.mean_m,
                empty: self.empty_m,
            },
            intersection: self.num_intersection,
            sizes_differ: self.sizes_differ(),
        }
    }

    /// The summary as a two-row polars frame.
    pub fn summary_frame(&self) -> Result<DataFrame, PolarsError> {
        summary_frame::to_dataframe(&self.summary())
    }

    /// Hand the normalized `(fixed, moving)` values to the caller.
    pub fn into_values(self) -> (Vec<f64>, Vec<f64>) {
        (self.values_f, self.values_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Volume;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn fuzzy_scenario() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = vec![0.0, 0.5, 2.0, -1.0];
        let moving = vec![1.0, 0.0, 0.0, 0.0];
        let stats = VoxelStatistics::new(&fixed, &moving, true, 0.5)?;

        assert_eq!(stats.values_f, vec![0.0, 0.5, 1.0, 0.0]);
        assert_close(stats.mean_f, 0.375);
        assert_eq!(stats.num_nonzero_points_f, 3);
        assert!(!stats.fixed_is_empty());

        assert_eq!(stats.values_m, vec![1.0, 0.0, 0.0, 0.0]);
        assert_close(stats.mean_m, 0.25);
        assert_eq!(stats.num_nonzero_points_m, 1);
        assert!(!stats.moving_is_empty());

        assert_eq!(stats.num_intersection, 0);
        assert!(!stats.sizes_differ());
        Ok(())
    }

    #[test]
    fn binary_scenario() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = vec![0.0, 0.5, 2.0, -1.0];
        let moving = vec![1.0, 0.0, 0.0, 0.0];
        let stats = VoxelStatistics::new(&fixed, &moving, false, 1.0)?;

        assert_eq!(stats.values_f, vec![0.0, 0.0, 1.0, 0.0]);
        assert_close(stats.mean_f, 0.25);
        assert_eq!(stats.values_m, vec![1.0, 0.0, 0.0, 0.0]);
        // binary runs leave the emptiness flags untouched
        assert!(stats.fixed_is_empty());
        assert!(stats.moving_is_empty());
        Ok(())
    }

    #[test]
    fn counts_follow_enumeration() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = Volume::zeros([3, 4, 5]);
        let moving = Volume::zeros([2, 2, 2]);
        let stats = VoxelStatistics::new(&fixed, &moving, true, 0.5)?;

        assert_eq!(stats.fixed_voxel_count(), 60);
        assert_eq!(stats.moving_voxel_count(), 8);
        assert_eq!(stats.values_f.len(), stats.number_elements_f);
        assert_eq!(stats.values_m.len(), stats.number_elements_m);
        assert!(stats.sizes_differ());
        assert!(stats.fixed_is_empty());
        assert!(stats.moving_is_empty());
        Ok(())
    }

    #[test]
    fn shared_support_intersects() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = vec![0.0, 3.0, 0.0, 0.2];
        let moving = vec![0.0, -1.0, 4.0, 0.0];
        let stats = VoxelStatistics::new(&fixed, &moving, true, 0.5)?;
        assert!(stats.num_intersection >= 1);
        assert_eq!(stats.num_intersection, 1);
        Ok(())
    }

    #[test]
    fn mismatched_sizes_truncate_the_intersection() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let moving = vec![1.0, 1.0];
        let stats = VoxelStatistics::new(&fixed, &moving, false, 0.5)?;
        assert!(stats.sizes_differ());
        assert_eq!(stats.num_intersection, 2);
        Ok(())
    }

    #[test]
    fn mean_matches_sum_of_values() -> Result<(), Box<dyn std::error::Error>> {
        let fixed: Vec<f64> = (0..97).map(|i| (i as f64 * 0.37).sin() * 1.5).collect();
        let moving: Vec<f64> = (0..97).map(|i| (i as f64 * 0.11).cos()).collect();

        for fuzzy in [true, false] {
            let stats = VoxelStatistics::new(&fixed, &moving, fuzzy, 0.1)?;
            let sum_f: f64 = stats.values_f.iter().sum();
            let sum_m: f64 = stats.values_m.iter().sum();
            assert_close(stats.mean_f, sum_f / stats.number_elements_f as f64);
            assert_close(stats.mean_m, sum_m / stats.number_elements_m as f64);
        }
        Ok(())
    }

    #[test]
    fn single_clamped_voxel_is_not_empty() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = vec![0.0, 0.0, -5.0];
        let moving = vec![0.0, 0.0, 0.0];
        let stats = VoxelStatistics::new(&fixed, &moving, true, 0.5)?;
        assert_eq!(stats.values_f, vec![0.0, 0.0, 0.0]);
        assert!(!stats.fixed_is_empty());
        assert!(stats.moving_is_empty());
        Ok(())
    }

    #[test]
    fn zero_length_volumes_report_zero_means() -> Result<(), Box<dyn std::error::Error>> {
        let none: Vec<f64> = Vec::new();
        let some = vec![0.25, 0.75];
        let stats = VoxelStatistics::new(&none, &some, true, 0.5)?;

        assert_eq!(stats.fixed_voxel_count(), 0);
        assert_eq!(stats.mean_f, 0.0);
        assert_close(stats.mean_m, 0.5);
        assert_eq!(stats.num_intersection, 0);
        assert!(stats.sizes_differ());
        Ok(())
    }

    #[test]
    fn construction_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let fixed: Vec<f64> = (0..64).map(|i| (i % 7) as f64 / 3.0 - 0.5).collect();
        let moving: Vec<f64> = (0..64).map(|i| (i % 5) as f64 / 2.0).collect();

        let first = VoxelStatistics::new(&fixed, &moving, true, 0.5)?;
        let second = VoxelStatistics::new(&fixed, &moving, true, 0.5)?;
        assert_eq!(first.mean_f.to_bits(), second.mean_f.to_bits());
        assert_eq!(first.mean_m.to_bits(), second.mean_m.to_bits());
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn parallel_matches_sequential() -> Result<(), Box<dyn std::error::Error>> {
        let shape = [8, 9, 10];
        let len = shape.iter().product::<usize>();
        let fixed = Volume::from_shape_vec(
            shape,
            (0..len).map(|i| ((i * 31) % 17) as f64 / 8.0 - 0.5).collect(),
        )?;
        let moving = Volume::from_shape_vec(
            shape,
            (0..len).map(|i| ((i * 7) % 11) as f64 / 5.0 - 0.2).collect(),
        )?;

        for fuzzy in [true, false] {
            let sequential = VoxelStatistics::new(&fixed, &moving, fuzzy, 0.4)?;
            let parallel = VoxelStatistics::compute_parallel(&fixed, &moving, fuzzy, 0.4)?;
            assert_eq!(sequential.mean_f.to_bits(), parallel.mean_f.to_bits());
            assert_eq!(sequential.mean_m.to_bits(), parallel.mean_m.to_bits());
            assert_eq!(sequential, parallel);
        }
        Ok(())
    }

    #[test]
    fn compute_honours_options() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = ndarray::Array3::from_elem((2, 2, 2), 0.7);
        let moving = ndarray::Array3::<f64>::zeros((2, 2, 2));

        let options = PreprocessOptions::from_json(r#"{"threshold": 0.8, "parallel": true}"#)?;
        let stats = VoxelStatistics::compute(&fixed, &moving, &options)?;
        assert_eq!(stats.values_f, vec![0.0; 8]);
        assert_eq!(stats.num_nonzero_points_f, 8);
        assert_eq!(stats.num_intersection, 0);
        Ok(())
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let fixed = vec![1.0];
        let err = VoxelStatistics::new(&fixed, &fixed, false, f64::NAN).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidArgument { .. }));
    }

    #[test]
    fn infinite_thresholds_binarize_uniformly() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = vec![0.0, 0.5, 2.0];
        let moving = vec![-1.0, 0.0, 1e300];

        let above = VoxelStatistics::new(&fixed, &moving, false, f64::INFINITY)?;
        assert_eq!(above.values_f, vec![0.0, 0.0, 0.0]);
        assert_eq!(above.values_m, vec![0.0, 0.0, 0.0]);
        assert_eq!(above.mean_f, 0.0);

        let below = VoxelStatistics::compute_parallel(&fixed, &moving, false, f64::NEG_INFINITY)?;
        assert_eq!(below.values_f, vec![1.0, 1.0, 1.0]);
        assert_eq!(below.values_m, vec![1.0, 1.0, 1.0]);
        assert_eq!(below.mean_m, 1.0);
        Ok(())
    }

    /// A source backed by interior mutability, so it is not `Sync`.
    struct CellVolume(Vec<std::cell::Cell<f64>>);

    impl VoxelSource for CellVolume {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn voxels(&self) -> impl Iterator<Item = f64> + '_ {
            self.0.iter().map(std::cell::Cell::get)
        }
    }

    #[test]
    fn sequential_compute_accepts_non_sync_sources() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = CellVolume([0.0, 0.5, 2.0, -1.0].map(std::cell::Cell::new).to_vec());
        let moving = CellVolume([1.0, 0.0, 0.0, 0.0].map(std::cell::Cell::new).to_vec());

        let options = PreprocessOptions::builder().fuzzy(true).parallel(true).build();
        let stats = VoxelStatistics::compute_sequential(&fixed, &moving, &options)?;
        assert_eq!(stats.values_f, vec![0.0, 0.5, 1.0, 0.0]);
        assert_close(stats.mean_f, 0.375);
        assert_eq!(stats.num_intersection, 0);
        Ok(())
    }

    #[test]
    fn summary_reports_scalars() -> Result<(), Box<dyn std::error::Error>> {
        let fixed = vec![0.0, 0.5, 2.0, -1.0];
        let moving = vec![1.0, 0.0, 0.0];
        let stats = VoxelStatistics::new(&fixed, &moving, true, 0.5)?;

        let summary = stats.summary();
        assert_eq!(summary.fixed.voxel_count, 4);
        assert_eq!(summary.moving.nonzero_count, 1);
        assert!(summary.sizes_differ);

        let json: serde_json::Value = serde_json::from_str(&summary.to_json()?)?;
        assert_eq!(json["fixed"]["nonzero_count"], 3);
        assert_eq!(json["intersection"], 0);

        let df = stats.summary_frame()?;
        assert_eq!(df.height(), 2);

        let (values_f, values_m) = stats.into_values();
        assert_eq!(values_f.len(), 4);
        assert_eq!(values_m.len(), 3);
        Ok(())
    }
}
