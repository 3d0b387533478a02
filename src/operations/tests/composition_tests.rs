//! Chains of spectral transforms: ordering, fitting and error propagation.

use approx_eq::assert_approx_eq;
use ndarray::{Array1, Array2};

use super::{create_test_signal, max_difference};
use crate::batch::apply_transform_to_list;
use crate::operations::{
    ComposedTransform, IfConfig, InstantaneousFrequency, Magnitude, MagnitudeConfig,
    NormalizationMode, Normalize, Phase, SpectralRepresentation, Stft, StftConfig, Transform,
    compose,
};
use crate::{AudioTransform, TransformData, TransformError};

fn stft() -> Stft {
    Stft::new(StftConfig::new().with_sizes(128, 32)).unwrap()
}

fn cartesian() -> SpectralRepresentation {
    SpectralRepresentation::cartesian(NormalizationMode::Bipolar, NormalizationMode::Bipolar, Some(-2))
}

fn polar() -> SpectralRepresentation {
    SpectralRepresentation::polar(NormalizationMode::Unipolar, NormalizationMode::Gaussian, Some(-2))
}

fn names(chain: &ComposedTransform) -> Vec<&'static str> {
    chain.iter().map(AudioTransform::name).collect()
}

#[test]
fn test_grouping_does_not_change_children() {
    let magnitude = || Magnitude::linear(NormalizationMode::Unipolar);
    let phase = || Phase::new(NormalizationMode::Gaussian);

    let left = (stft() + magnitude()) + phase();
    let right = stft() + (magnitude() + phase());
    assert_eq!(names(&left), vec!["STFT", "Magnitude", "Phase"]);
    assert_eq!(names(&left), names(&right));
    assert_eq!(
        left.to_string(),
        "STFT(n_fft=128, hop_length=32, window=Hanning, center=true) \
         + Magnitude(norm=unipolar, contrast=log1p) + Phase(norm=gaussian)"
    );
}

#[test]
fn test_grouping_does_not_change_results() {
    let audio = create_test_signal(1024);
    let normalize = || Normalize::new(NormalizationMode::Gaussian);

    let mut left = (stft() + cartesian()) + normalize();
    let mut right = stft() + (cartesian() + normalize());
    left.scale_data(&audio).unwrap();
    right.scale_data(&audio).unwrap();

    let y_left = left.forward(&audio).unwrap();
    let y_right = right.forward(&audio).unwrap();
    assert_eq!(y_left, y_right);

    let back_left = left.invert(&y_left).unwrap();
    let back_right = right.invert(&y_left).unwrap();
    assert_eq!(back_left, back_right);
    assert!(max_difference(&back_left, &audio) < 1e-4);
}

#[test]
fn test_chain_inverse_is_reverse_application() {
    let audio = create_test_signal(1024);
    let mut stft = Transform::from(stft());
    let mut polar = Transform::from(polar());
    stft.scale_data(&audio).unwrap();
    polar.scale_data(&stft.forward(&audio).unwrap()).unwrap();

    let chain = stft.clone() + polar.clone();
    let y = chain.forward(&audio).unwrap();
    assert_eq!(y, polar.forward(&stft.forward(&audio).unwrap()).unwrap());

    let expected = stft.invert(&polar.invert(&y).unwrap()).unwrap();
    assert_eq!(chain.invert(&y).unwrap(), expected);
}

#[test]
fn test_scale_data_fits_every_child_in_turn() {
    let audio = create_test_signal(2048);
    let mut chain = stft() + polar() + Normalize::new(NormalizationMode::Gaussian);
    assert!(chain.needs_scaling());
    chain.scale_data(&audio).unwrap();

    let y = chain.forward(&audio).unwrap();
    let values = y.as_real("test").unwrap();
    let n = values.len() as f64;
    let mean = values.sum() / n;
    let std = (values.mapv(|v| (v - mean).powi(2)).sum() / n).sqrt();
    assert!(mean.abs() < 1e-9, "mean {mean}");
    assert_approx_eq!(std, 1.0, 1e-6);
}

#[test]
fn test_unfitted_child_is_reported() {
    let audio = create_test_signal(512);
    let chain = stft() + polar();
    let err = chain.forward(&audio).unwrap_err();
    assert!(matches!(err, TransformError::NotFitted { .. }), "{err}");
}

#[test]
fn test_weighted_if_blocks_inversion_of_the_chain() {
    let audio = create_test_signal(1024);
    let weighted = InstantaneousFrequency::new(IfConfig::new().with_weighting(true));
    let polar_if = SpectralRepresentation::from_parts(
        Magnitude::new(MagnitudeConfig::linear(NormalizationMode::Unipolar)).unwrap(),
        weighted,
        Some(-2),
    )
    .unwrap();

    let mut chain = stft() + polar_if;
    assert!(!chain.invertible());
    chain.scale_data(&audio).unwrap();
    let y = chain.forward(&audio).unwrap();
    assert_eq!(y.shape(), &[33, 2, 65]);

    let err = chain.invert(&y).unwrap_err();
    assert!(err.is_not_invertible());
    assert!(err.to_string().contains("child 1"), "{err}");
}

#[test]
fn test_mismatched_chain_fails_on_kind() {
    // Phase of a real magnitude is real, which the STFT cannot invert
    let audio = create_test_signal(512);
    let mut chain = compose(stft(), Magnitude::linear(NormalizationMode::Unipolar))
        + Phase::new(NormalizationMode::None);
    chain.scale_data(&audio).unwrap();
    let y = chain.forward(&audio).unwrap();
    let err = chain.invert(&y).unwrap_err();
    assert!(matches!(err, TransformError::UnexpectedData { .. }), "{err}");
}

#[test]
fn test_time_channel_follows_frames() {
    let sample_rate = 16000.0;
    let audio = create_test_signal(1024);
    let time = Array1::from_shape_fn(1024, |n| n as f64 / sample_rate).into_dyn();

    let mut chain = stft() + polar();
    chain.scale_data(&audio).unwrap();
    let (features, frame_times) = chain.forward_with_time(&audio, time).unwrap();
    assert_eq!(features.shape(), &[33, 2, 65]);
    assert_eq!(frame_times.shape(), &[33]);
    for (k, &t) in frame_times.iter().enumerate() {
        let centre = (k * 32).min(1023) as f64;
        assert!((t - centre / sample_rate).abs() < 1e-12);
    }
}

#[test]
fn test_per_item_time_channel_passes_through_magnitude_chain() {
    let audio = TransformData::from(Array2::from_shape_fn((2, 1024), |(c, n)| {
        ((c + 1) as f64 * 0.013 * n as f64).sin()
    }));
    let time = Array1::<f64>::zeros(2).into_dyn();

    let mut chain = stft() + Magnitude::linear(NormalizationMode::Unipolar);
    chain.scale_data(&audio).unwrap();
    let (features, item_times) = chain.forward_with_time(&audio, time.clone()).unwrap();
    assert_eq!(features.shape(), &[2, 33, 65]);
    assert_eq!(item_times, time);
}

#[test]
fn test_lists_through_a_fitted_chain() {
    let items: Vec<TransformData> = (0..4)
        .map(|i| {
            TransformData::from(Array2::from_shape_fn((1, 512), |(_, n)| {
                (0.01 * (i + 1) as f64 * n as f64).sin()
            }))
        })
        .collect();

    let mut chain = stft() + cartesian();
    chain.scale_data(&items[0]).unwrap();

    let sequential = apply_transform_to_list(&chain, &items).unwrap();
    assert!(sequential.iter().all(|y| y.shape() == &[1, 17, 2, 65]));

    #[cfg(feature = "parallel-processing")]
    {
        use crate::batch::{par_apply_invert_transform_to_list, par_apply_transform_to_list};
        use crate::traits::InversionOptions;

        let parallel = par_apply_transform_to_list(&chain, &items).unwrap();
        assert_eq!(sequential, parallel);

        let restored =
            par_apply_invert_transform_to_list(&chain, &parallel, &InversionOptions::default())
                .unwrap();
        for (back, original) in restored.iter().zip(&items) {
            assert!(max_difference(back, original) < 1e-4);
        }
    }
}
