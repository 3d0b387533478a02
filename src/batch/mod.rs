//! Applying one transform to many inputs.
//!
//! The sequential helpers stop at the first failing item and report its
//! position through [`TransformError::BatchItem`]. With the
//! `parallel-processing` feature, [`parallel`] offers rayon-backed
//! equivalents that keep the input order.

use ndarray::ArrayD;

use crate::traits::{AudioTransform, InversionOptions};
use crate::{TransformData, TransformError, TransformResult};

#[cfg(feature = "parallel-processing")]
pub mod parallel;

#[cfg(feature = "parallel-processing")]
pub use parallel::{
    ParallelConfig, ParallelProcessor, par_apply_invert_transform_to_list,
    par_apply_invert_transform_to_list_with, par_apply_transform_to_list,
    par_apply_transform_to_list_with,
};

/// Applies `transform.forward` to every item.
pub fn apply_transform_to_list<T>(
    transform: &T,
    items: &[TransformData],
) -> TransformResult<Vec<TransformData>>
where
    T: AudioTransform + ?Sized,
{
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            transform
                .forward(item)
                .map_err(|e| TransformError::batch_item(index, e))
        })
        .collect()
}

/// Applies `transform.forward_with_time` to every item and its time channel.
///
/// # Errors
/// Fails with [`TransformError::DimensionMismatch`] if the two lists differ
/// in length.
pub fn apply_transform_to_list_with_time<T>(
    transform: &T,
    items: &[TransformData],
    times: Vec<ArrayD<f64>>,
) -> TransformResult<Vec<(TransformData, ArrayD<f64>)>>
where
    T: AudioTransform + ?Sized,
{
    if items.len() != times.len() {
        return Err(TransformError::dimension_mismatch(format!(
            "{} items but {} time channels",
            items.len(),
            times.len()
        )));
    }
    items
        .iter()
        .zip(times)
        .enumerate()
        .map(|(index, (item, time))| {
            transform
                .forward_with_time(item, time)
                .map_err(|e| TransformError::batch_item(index, e))
        })
        .collect()
}

/// Applies `transform.invert_with` to every item.
pub fn apply_invert_transform_to_list<T>(
    transform: &T,
    items: &[TransformData],
    options: &InversionOptions,
) -> TransformResult<Vec<TransformData>>
where
    T: AudioTransform + ?Sized,
{
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            transform
                .invert_with(item, options)
                .map_err(|e| TransformError::batch_item(index, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{Normalize, NormalizationMode, NormalizationStats, Phase};
    use ndarray::array;

    fn scaler() -> Normalize {
        Normalize::with_stats(
            NormalizationMode::Unipolar,
            NormalizationStats::Range { min: 0.0, max: 4.0 },
        )
    }

    #[test]
    fn test_forward_and_invert_lists() {
        let items = vec![
            TransformData::from(array![0.0, 2.0]),
            TransformData::from(array![4.0]),
        ];
        let scaled = apply_transform_to_list(&scaler(), &items).unwrap();
        assert_eq!(scaled[0], TransformData::from(array![0.0, 0.5]));
        assert_eq!(scaled[1], TransformData::from(array![1.0]));

        let restored =
            apply_invert_transform_to_list(&scaler(), &scaled, &InversionOptions::default()).unwrap();
        assert_eq!(restored, items);
    }

    #[test]
    fn test_failing_item_reports_index() {
        let items = vec![
            TransformData::from(array![1.0]),
            TransformData::from((array![1.0].into_dyn(), array![1.0].into_dyn())),
        ];
        let err = apply_transform_to_list(&Phase::new(NormalizationMode::None), &items).unwrap_err();
        assert!(matches!(err, TransformError::BatchItem { index: 1, .. }));
    }

    #[test]
    fn test_time_lists_must_match() {
        let items = vec![TransformData::from(array![1.0])];
        let err = apply_transform_to_list_with_time(&scaler(), &items, Vec::new()).unwrap_err();
        assert!(matches!(err, TransformError::DimensionMismatch(_)));

        let times = vec![array![0.25].into_dyn()];
        let out = apply_transform_to_list_with_time(&scaler(), &items, times).unwrap();
        assert_eq!(out[0].1, array![0.25].into_dyn());
    }
}
