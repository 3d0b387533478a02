//! Scenario tests for complete transform pipelines.
//!
//! Unit behaviour is tested next to each transform; these suites exercise
//! the transforms together the way a feature pipeline uses them.

use ndarray::{Array1, Array2};
use num_complex::Complex;

use crate::TransformData;

mod composition_tests;

/// Two-tone test signal with a slow amplitude envelope.
pub(crate) fn create_test_signal(samples: usize) -> TransformData {
    TransformData::from(Array1::from_shape_fn(samples, |n| {
        let t = n as f64;
        (1.0 + 0.5 * (0.002 * t).sin()) * (0.05 * t).sin() + 0.3 * (0.31 * t + 1.0).cos()
    }))
}

/// Complex spectrum `(frames, bins)` with smooth magnitudes and phase that
/// advances by less than `π` per frame in every bin.
pub(crate) fn create_test_spectrum(frames: usize, bins: usize) -> TransformData {
    TransformData::from(Array2::from_shape_fn((frames, bins), |(t, f)| {
        let magnitude = 0.25 + 0.1 * f as f64 + 0.05 * (t as f64).cos();
        let phase = 0.3 * (f + 1) as f64 * t as f64 / bins as f64 * 4.0 - 0.5;
        Complex::from_polar(magnitude, phase)
    }))
}

/// Largest element-wise difference, panicking on kind or shape mismatch.
pub(crate) fn max_difference(a: &TransformData, b: &TransformData) -> f64 {
    a.max_abs_difference(b)
        .unwrap_or_else(|| panic!("cannot compare {:?} {} with {:?} {}", a.shape(), a.kind(), b.shape(), b.kind()))
}
