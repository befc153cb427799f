use crate::types::StatisticsSummary;
use itertools::Itertools;
use polars::prelude::*;

/// One row per volume with its scalar statistics.
pub fn to_dataframe(summary: &StatisticsSummary) -> Result<DataFrame, PolarsError> {
    let (volumes, voxel_counts, nonzero_counts, means, empty): (
        Vec<&str>,
        Vec<u64>,
        Vec<u64>,
        Vec<f64>,
        Vec<bool>,
    ) = summary
        .volumes()
        .iter()
        .map(|(role, volume)| {
            (
                *role,
                volume.voxel_count as u64,
                volume.nonzero_count as u64,
                volume.mean,
                volume.empty,
            )
        })
        .multiunzip();

    DataFrame::new(vec![
        Series::new("volume".into(), &volumes).into(),
        Series::new("voxel_count".into(), &voxel_counts).into(),
        Series::new("nonzero_count".into(), &nonzero_counts).into(),
        Series::new("mean".into(), &means).into(),
        Series::new("empty".into(), &empty).into(),
    ])
}

/// Rows of volumes that contain at least one nonzero raw value.
pub fn non_empty_volumes(df: &DataFrame) -> Result<LazyFrame, PolarsError> {
    Ok(df.clone().lazy().filter(col("empty").not()))
}
