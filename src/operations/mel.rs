//! Mel filter bank and its pseudo-inverse.
//!
//! Triangular filters are spaced linearly on the mel scale between DC and
//! Nyquist. The bank is stored twice:
//!
//! - `forward` `(n_freqs, n_mels)`: each column normalised to sum to one, so
//!   every mel bin is a weighted average of the linear bins it covers.
//! - `inverse` `(n_mels, n_freqs)`: the transposed bank with each linear bin's
//!   weights normalised to sum to one, so every linear bin is rebuilt as a
//!   weighted average of the mel bins covering it.
//!
//! Empty filters (possible when `n_mels` is close to `n_freqs`) keep zero
//! weights instead of dividing by zero.

use ndarray::{Array2, ArrayD, Axis};
use serde::{Deserialize, Serialize};

use crate::utils::audio_math::{fft_frequencies, mel_frequencies};
use crate::utils::tensor_ops::matmul_last_axis;
use crate::{TransformError, TransformResult};

/// Immutable pair of mel projection matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelFilterBank {
    n_fft: usize,
    sample_rate: u32,
    forward: Array2<f64>,
    inverse: Array2<f64>,
}

impl MelFilterBank {
    /// Builds a bank with as many mel bins as linear bins (`n_fft / 2 + 1`).
    pub fn new(n_fft: usize, sample_rate: u32) -> TransformResult<Self> {
        Self::with_mels(n_fft, sample_rate, n_fft / 2 + 1)
    }

    /// Builds a bank with `n_mels` output bins.
    ///
    /// # Errors
    /// Fails if any size or the sample rate is zero.
    pub fn with_mels(n_fft: usize, sample_rate: u32, n_mels: usize) -> TransformResult<Self> {
        if n_fft == 0 || n_mels == 0 || sample_rate == 0 {
            return Err(TransformError::invalid_parameter(format!(
                "mel filter bank needs positive sizes (n_fft = {n_fft}, n_mels = {n_mels}, sample_rate = {sample_rate})"
            )));
        }

        let bank = triangular_filters(n_fft, f64::from(sample_rate), n_mels);

        let mut forward = bank.clone();
        for mut column in forward.axis_iter_mut(Axis(1)) {
            let total = column.sum();
            if total != 0.0 {
                column.mapv_inplace(|w| w / total);
            }
        }

        let mut inverse = bank;
        for mut row in inverse.axis_iter_mut(Axis(0)) {
            let total = row.sum();
            if total != 0.0 {
                row.mapv_inplace(|w| w / total);
            }
        }
        let inverse = inverse.reversed_axes().as_standard_layout().into_owned();

        tracing::debug!(n_fft, sample_rate, n_mels, "built mel filter bank");

        Ok(Self {
            n_fft,
            sample_rate,
            forward,
            inverse,
        })
    }

    /// FFT size the bank was built for.
    pub const fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Sample rate the bank was built for.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of linear frequency bins, `n_fft / 2 + 1`.
    pub fn n_freqs(&self) -> usize {
        self.forward.nrows()
    }

    /// Number of mel bins.
    pub fn n_mels(&self) -> usize {
        self.forward.ncols()
    }

    /// Forward projection matrix `(n_freqs, n_mels)`.
    pub const fn forward_matrix(&self) -> &Array2<f64> {
        &self.forward
    }

    /// Pseudo-inverse matrix `(n_mels, n_freqs)`.
    pub const fn inverse_matrix(&self) -> &Array2<f64> {
        &self.inverse
    }

    /// Projects linear magnitudes `(..., n_freqs)` to mel `(..., n_mels)`.
    pub fn project(&self, magnitudes: &ArrayD<f64>) -> TransformResult<ArrayD<f64>> {
        matmul_last_axis(magnitudes, &self.forward)
    }

    /// Maps mel magnitudes `(..., n_mels)` back to linear `(..., n_freqs)`.
    pub fn unproject(&self, mel: &ArrayD<f64>) -> TransformResult<ArrayD<f64>> {
        matmul_last_axis(mel, &self.inverse)
    }
}

/// Unnormalised triangular filters `(n_freqs, n_mels)` on the HTK mel scale.
fn triangular_filters(n_fft: usize, sample_rate: f64, n_mels: usize) -> Array2<f64> {
    let freq_bins = fft_frequencies(n_fft, sample_rate);
    let n_freqs = freq_bins.len();
    let f_max = sample_rate / 2.0;

    // n_mels + 2 edges: filter m rises on [f[m], f[m+1]] and falls on [f[m+1], f[m+2]]
    let edges = mel_frequencies(n_mels + 2, 0.0, f_max);

    let mut bank = Array2::zeros((n_freqs, n_mels));
    for m in 0..n_mels {
        let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
        let rise = center - left;
        let fall = right - center;
        for (bin, &freq) in freq_bins.iter().enumerate() {
            let up = if rise > 0.0 { (freq - left) / rise } else { 0.0 };
            let down = if fall > 0.0 { (right - freq) / fall } else { 0.0 };
            bank[[bin, m]] = up.min(down).max(0.0);
        }
    }
    bank
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_shapes() {
        let bank = MelFilterBank::with_mels(512, 16000, 40).unwrap();
        assert_eq!(bank.n_freqs(), 257);
        assert_eq!(bank.n_mels(), 40);
        assert_eq!(bank.forward_matrix().dim(), (257, 40));
        assert_eq!(bank.inverse_matrix().dim(), (40, 257));
    }

    #[test]
    fn test_forward_columns_sum_to_one() {
        let bank = MelFilterBank::new(1024, 44100).unwrap();
        for column in bank.forward_matrix().axis_iter(Axis(1)) {
            let total = column.sum();
            assert!(total == 0.0 || (total - 1.0).abs() < 1e-9, "column sum {total}");
        }
        let non_empty = bank
            .forward_matrix()
            .axis_iter(Axis(1))
            .filter(|c| c.sum() > 0.0)
            .count();
        assert!(non_empty > bank.n_mels() / 2);
    }

    #[test]
    fn test_inverse_rows_sum_to_one() {
        let bank = MelFilterBank::with_mels(512, 22050, 64).unwrap();
        for column in bank.inverse_matrix().axis_iter(Axis(1)) {
            let total = column.sum();
            assert!(total == 0.0 || (total - 1.0).abs() < 1e-9, "bin sum {total}");
        }
    }

    #[test]
    fn test_constant_spectrum_survives_round_trip() {
        let bank = MelFilterBank::with_mels(256, 16000, 32).unwrap();
        let flat = Array3::from_elem((2, 5, bank.n_freqs()), 3.0).into_dyn();
        let mel = bank.project(&flat).unwrap();
        assert_eq!(mel.shape(), &[2, 5, 32]);
        let back = bank.unproject(&mel).unwrap();
        assert_eq!(back.shape(), flat.shape());
        // every linear bin covered by at least one filter is a convex
        // combination of averages of a constant, hence the constant again
        for (&orig, &rebuilt) in flat.iter().zip(back.iter()) {
            assert!(rebuilt == 0.0 || (rebuilt - orig).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(MelFilterBank::with_mels(0, 16000, 10).is_err());
        assert!(MelFilterBank::with_mels(512, 16000, 0).is_err());
        assert!(MelFilterBank::with_mels(512, 0, 10).is_err());
    }
}
