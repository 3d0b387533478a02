//! Frequency-scale conversions used to build mel filter banks.
//!
//! The mel conversions use the HTK formula, matching the filter banks most
//! training pipelines are built against.
//!
//! # Examples
//!
//! ```rust
//! use audio_transforms::audio_math::{hz_to_mel, mel_to_hz};
//!
//! let mel = hz_to_mel(440.0f64);
//! let hz = mel_to_hz(mel);
//! assert!((hz - 440.0).abs() < 1e-9);
//! ```

use crate::{RealFloat, to_precision};

/// Converts frequency in Hz to mel scale.
///
/// Uses the formula `mel = 2595 * log10(1 + hz / 700)`.
///
/// # Examples
///
/// ```rust
/// use audio_transforms::audio_math::hz_to_mel;
///
/// let mel = hz_to_mel(1000.0f64);
/// assert!((mel - 1000.0).abs() < 1.0);
/// ```
pub fn hz_to_mel<F: RealFloat>(freq_hz: F) -> F {
    to_precision::<F, _>(2595.0) * (F::one() + freq_hz / to_precision::<F, _>(700.0)).log10()
}

/// Converts mel scale value back to frequency in Hz.
///
/// Inverse of [`hz_to_mel`]: `hz = 700 * (10^(mel / 2595) - 1)`.
pub fn mel_to_hz<F: RealFloat>(mel: F) -> F {
    to_precision::<F, _>(700.0)
        * (to_precision::<F, _>(10.0).powf(mel / to_precision::<F, _>(2595.0)) - F::one())
}

/// Generates the positive frequency bins of a real-valued FFT.
///
/// # Examples
///
/// ```rust
/// use audio_transforms::audio_math::fft_frequencies;
///
/// let freqs = fft_frequencies(1024, 44100.0f64);
/// assert_eq!(freqs.len(), 513);
/// assert_eq!(freqs[0], 0.0);
/// assert!((freqs[512] - 22050.0).abs() < 1e-9);
/// ```
pub fn fft_frequencies<F: RealFloat>(n_fft: usize, sample_rate: F) -> Vec<F> {
    let n_bins = n_fft / 2 + 1;
    let freq_resolution = sample_rate / to_precision::<F, _>(n_fft);

    (0..n_bins)
        .map(|i| to_precision::<F, _>(i) * freq_resolution)
        .collect()
}

/// Generates `n_mels` points linearly spaced in mel between `fmin` and `fmax`,
/// returned in Hz.
pub fn mel_frequencies<F: RealFloat>(n_mels: usize, fmin: F, fmax: F) -> Vec<F> {
    linspace(hz_to_mel(fmin), hz_to_mel(fmax), n_mels)
        .into_iter()
        .map(mel_to_hz)
        .collect()
}

/// Generates `num` linearly spaced values from `start` to `end` inclusive.
pub fn linspace<F: RealFloat>(start: F, end: F, num: usize) -> Vec<F> {
    if num == 0 {
        return Vec::new();
    }
    if num == 1 {
        return vec![start];
    }

    let step = (end - start) / to_precision::<F, _>(num - 1);
    (0..num)
        .map(|i| start + to_precision::<F, _>(i) * step)
        .collect()
}
