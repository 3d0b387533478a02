//! Short-time Fourier transform between waveforms and complex spectra.
//!
//! Forward maps real `(..., T)` signals to one-sided complex spectra
//! `(..., frames, n_fft / 2 + 1)`; every leading axis is treated as a batch.
//! The inverse uses Hermitian completion, an inverse FFT and windowed
//! overlap-add normalized by the summed squared window, which reconstructs
//! every sample covered by a non-zero window coefficient exactly.

use std::f64::consts::PI;
use std::fmt;

use ndarray::{ArrayD, ArrayView2, Axis};
use rustfft::{FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use super::types::{StftConfig, WindowType};
use crate::traits::{AudioTransform, InversionOptions};
use crate::{TransformData, TransformError, TransformResult};

/// Generate window function coefficients.
///
/// Windows are symmetric (`size - 1` in the denominator); sizes below two
/// yield a single unit coefficient.
pub fn generate_window(size: usize, window_type: WindowType) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    let n_max = (size - 1) as f64;
    match window_type {
        WindowType::Rectangular => vec![1.0; size],
        WindowType::Hanning => (0..size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n_max).cos()))
            .collect(),
        WindowType::Hamming => (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / n_max).cos())
            .collect(),
        WindowType::Blackman => (0..size)
            .map(|i| {
                let n = i as f64;
                0.42 - 0.5 * (2.0 * PI * n / n_max).cos() + 0.08 * (4.0 * PI * n / n_max).cos()
            })
            .collect(),
    }
}

/// Short-time Fourier transform.
///
/// With `center` enabled the signal is zero-padded by `n_fft / 2` samples on
/// both sides, so frame `k` is centred on sample `k * hop_length`. Inverting a
/// centred spectrum of `frames` frames returns the first
/// `hop_length * (frames - 1)` samples, which is the whole signal when its
/// length is a multiple of `hop_length`. Without centring the full
/// overlap-add span `hop_length * (frames - 1) + n_fft` is returned.
///
/// # Examples
/// ```rust
/// use audio_transforms::{AudioTransform, Stft, StftConfig, TransformData};
/// use ndarray::Array1;
///
/// let stft = Stft::new(StftConfig::new().with_sizes(64, 16)).unwrap();
/// let signal = TransformData::from(Array1::from_shape_fn(256, |n| (0.05 * n as f64).sin()));
///
/// let spectrum = stft.forward(&signal).unwrap();
/// assert_eq!(spectrum.shape(), &[17, 33]);
///
/// let rebuilt = stft.invert(&spectrum).unwrap();
/// assert!(rebuilt.max_abs_difference(&signal).unwrap() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stft {
    config: StftConfig,
}

impl Stft {
    /// Validates the configuration and builds the transform.
    ///
    /// # Errors
    /// Fails if `n_fft` or `hop_length` is zero, or if `hop_length > n_fft`.
    pub fn new(config: StftConfig) -> TransformResult<Self> {
        if config.n_fft == 0 || config.hop_length == 0 {
            return Err(TransformError::invalid_parameter(
                "Window size and hop size must be greater than 0",
            ));
        }
        if config.hop_length > config.n_fft {
            return Err(TransformError::invalid_parameter(
                "Hop size cannot be larger than window size",
            ));
        }
        Ok(Self { config })
    }

    /// The validated configuration.
    pub const fn config(&self) -> &StftConfig {
        &self.config
    }

    const fn padding(&self) -> usize {
        if self.config.center {
            self.config.n_fft / 2
        } else {
            0
        }
    }

    /// Number of frames produced for a signal of `len` samples.
    ///
    /// # Errors
    /// Fails if the (padded) signal is shorter than one frame.
    pub fn num_frames(&self, len: usize) -> TransformResult<usize> {
        let padded = len + 2 * self.padding();
        if len == 0 || padded < self.config.n_fft {
            return Err(TransformError::dimension_mismatch(format!(
                "Audio length {len} is shorter than window size {}",
                self.config.n_fft
            )));
        }
        Ok((padded - self.config.n_fft) / self.config.hop_length + 1)
    }

    fn analyse(&self, samples: &[f64], window: &[f64], out: &mut Vec<Complex<f64>>) -> TransformResult<()> {
        let StftConfig { n_fft, hop_length, .. } = self.config;
        let pad = self.padding();
        let num_frames = self.num_frames(samples.len())?;
        let n_bins = self.config.n_bins();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut frame_buffer = vec![Complex::new(0.0, 0.0); n_fft];

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop_length;
            for (i, slot) in frame_buffer.iter_mut().enumerate() {
                // position in the unpadded signal; outside it the padding is zero
                let sample = (start + i)
                    .checked_sub(pad)
                    .and_then(|idx| samples.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * window[i], 0.0);
            }
            fft.process(&mut frame_buffer);
            out.extend_from_slice(&frame_buffer[..n_bins]);
        }
        Ok(())
    }

    fn synthesise(&self, frames: ArrayView2<'_, Complex<f64>>, window: &[f64]) -> Vec<f64> {
        let StftConfig { n_fft, hop_length, .. } = self.config;
        let num_frames = frames.nrows();
        let n_bins = frames.ncols();

        let span = (num_frames - 1) * hop_length + n_fft;
        let mut output = vec![0.0f64; span];
        let mut window_sum = vec![0.0f64; span];

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(n_fft);
        let mut frame_buffer = vec![Complex::new(0.0, 0.0); n_fft];
        let scale = 1.0 / n_fft as f64;

        for (frame_idx, frame) in frames.outer_iter().enumerate() {
            for (k, slot) in frame_buffer.iter_mut().enumerate() {
                *slot = if k < n_bins {
                    frame[k]
                } else {
                    frame[n_fft - k].conj()
                };
            }
            ifft.process(&mut frame_buffer);

            let start = frame_idx * hop_length;
            for (i, value) in frame_buffer.iter().enumerate() {
                output[start + i] += value.re * scale * window[i];
                window_sum[start + i] += window[i] * window[i];
            }
        }

        for (sample, &weight) in output.iter_mut().zip(window_sum.iter()) {
            if weight > f64::EPSILON {
                *sample /= weight;
            } else {
                *sample = 0.0;
            }
        }

        if self.config.center {
            let pad = self.padding();
            output.drain(..pad);
            output.truncate((num_frames - 1) * hop_length);
        }
        output
    }

    /// Frame-centre positions, in samples of the unpadded signal.
    fn frame_centres(&self, num_frames: usize) -> impl Iterator<Item = usize> + '_ {
        let offset = if self.config.center { 0 } else { self.config.n_fft / 2 };
        (0..num_frames).map(move |k| k * self.config.hop_length + offset)
    }
}

impl fmt::Display for Stft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let StftConfig { n_fft, hop_length, window, center } = self.config;
        write!(
            f,
            "STFT(n_fft={n_fft}, hop_length={hop_length}, window={window:?}, center={center})"
        )
    }
}

impl AudioTransform for Stft {
    fn name(&self) -> &'static str {
        "STFT"
    }

    fn scriptable(&self) -> bool {
        true
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        let signal = x.as_real("STFT")?;
        let ndim = signal.ndim();
        if ndim == 0 {
            return Err(TransformError::dimension_mismatch("STFT needs at least one axis"));
        }
        let len = signal.len_of(Axis(ndim - 1));
        let batch: usize = signal.shape()[..ndim - 1].iter().product();
        let num_frames = self.num_frames(len)?;

        let window = generate_window(self.config.n_fft, self.config.window);
        let rows = signal.to_shape((batch, len))?;
        let mut values = Vec::with_capacity(batch * num_frames * self.config.n_bins());
        for row in rows.outer_iter() {
            let samples = row.to_vec();
            self.analyse(&samples, &window, &mut values)?;
        }

        let mut shape = signal.shape()[..ndim - 1].to_vec();
        shape.extend([num_frames, self.config.n_bins()]);
        tracing::trace!(?shape, "computed STFT");
        Ok(TransformData::Complex(ArrayD::from_shape_vec(shape, values)?))
    }

    fn invert_with(
        &self,
        y: &TransformData,
        _options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        let spectrum = y.as_complex("STFT")?;
        let ndim = spectrum.ndim();
        if ndim < 2 {
            return Err(TransformError::dimension_mismatch(
                "inverse STFT needs (..., frames, bins) input",
            ));
        }
        let (num_frames, n_bins) = (spectrum.shape()[ndim - 2], spectrum.shape()[ndim - 1]);
        if n_bins != self.config.n_bins() {
            return Err(TransformError::dimension_mismatch(format!(
                "spectrum has {n_bins} bins, expected {} for n_fft = {}",
                self.config.n_bins(),
                self.config.n_fft
            )));
        }
        if num_frames == 0 {
            return Err(TransformError::invalid_parameter("spectrum has no frames"));
        }

        let batch: usize = spectrum.shape()[..ndim - 2].iter().product();
        let window = generate_window(self.config.n_fft, self.config.window);
        let blocks = spectrum.to_shape((batch, num_frames, n_bins))?;

        let mut samples = Vec::new();
        let mut out_len = 0;
        for block in blocks.outer_iter() {
            let signal = self.synthesise(block, &window);
            out_len = signal.len();
            samples.extend(signal);
        }

        let mut shape = spectrum.shape()[..ndim - 2].to_vec();
        shape.push(out_len);
        Ok(TransformData::Real(ArrayD::from_shape_vec(shape, samples)?))
    }

    /// Carries the time channel alongside the spectrum.
    ///
    /// A channel shaped like the signal's batch axes (one value per item)
    /// passes through unchanged. A channel sharing the signal's last axis is
    /// resampled: its value at each frame centre (clamped to the last sample)
    /// becomes that frame's time stamp.
    fn forward_with_time(
        &self,
        x: &TransformData,
        time: ArrayD<f64>,
    ) -> TransformResult<(TransformData, ArrayD<f64>)> {
        let spectrum = self.forward(x)?;
        let (leading, len) = match x.shape().split_last() {
            Some((&len, leading)) => (leading, len),
            None => (&[][..], 0),
        };
        if time.shape() == leading {
            return Ok((spectrum, time));
        }
        let time_axis = match time.ndim() {
            0 => {
                return Err(TransformError::dimension_mismatch(format!(
                    "time channel is a scalar, expected shape {leading:?} or a last axis of {len}"
                )));
            }
            n => Axis(n - 1),
        };
        if time.len_of(time_axis) != len {
            return Err(TransformError::dimension_mismatch(format!(
                "time channel has shape {:?}, expected {leading:?} or a last axis of {len}",
                time.shape()
            )));
        }
        let num_frames = self.num_frames(len)?;
        let indices: Vec<usize> = self
            .frame_centres(num_frames)
            .map(|c| c.min(len - 1))
            .collect();
        let frame_times = time.select(time_axis, &indices);
        Ok((spectrum, frame_times))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    fn sine(len: usize) -> Array1<f64> {
        Array1::from_shape_fn(len, |n| {
            let t = n as f64;
            (0.03 * t).sin() + 0.4 * (0.21 * t + 0.5).cos()
        })
    }

    fn max_diff(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).fold(0.0, |acc, (x, y)| acc.max((x - y).abs()))
    }

    #[test]
    fn test_window_shapes() {
        let hann = generate_window(5, WindowType::Hanning);
        assert_eq!(hann.len(), 5);
        assert!(hann[0].abs() < 1e-12 && (hann[2] - 1.0).abs() < 1e-12);
        assert_eq!(generate_window(1, WindowType::Blackman), vec![1.0]);
        assert_eq!(generate_window(4, WindowType::Rectangular), vec![1.0; 4]);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(Stft::new(StftConfig::new().with_sizes(0, 1)).is_err());
        assert!(Stft::new(StftConfig::new().with_sizes(64, 0)).is_err());
        assert!(Stft::new(StftConfig::new().with_sizes(64, 65)).is_err());
    }

    #[test]
    fn test_short_uncentred_signal_rejected() {
        let stft = Stft::new(StftConfig::new().with_sizes(64, 16).with_center(false)).unwrap();
        let err = stft.forward(&TransformData::from(sine(32))).unwrap_err();
        assert!(matches!(err, TransformError::DimensionMismatch(_)));
    }

    #[test]
    fn test_single_frame_matches_dft() {
        let stft = Stft::new(
            StftConfig::new()
                .with_sizes(8, 8)
                .with_window(WindowType::Rectangular)
                .with_center(false),
        )
        .unwrap();
        let x = array![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let y = stft.forward(&TransformData::from(x)).unwrap().into_complex("test").unwrap();
        assert_eq!(y.shape(), &[1, 5]);
        assert!(y.iter().all(|c| (c - Complex::new(1.0, 0.0)).norm() < 1e-12));
    }

    #[test]
    fn test_centred_round_trip_all_windows() {
        for window in [WindowType::Hanning, WindowType::Hamming, WindowType::Blackman] {
            let stft = Stft::new(StftConfig::new().with_sizes(128, 32).with_window(window)).unwrap();
            let x = sine(1024);
            let spectrum = stft.forward(&TransformData::from(x.clone())).unwrap();
            assert_eq!(spectrum.shape(), &[33, 65]);
            let back = stft.invert(&spectrum).unwrap().into_real("test").unwrap();
            assert_eq!(back.len(), 1024);
            let diff = max_diff(back.as_slice().unwrap(), x.as_slice().unwrap());
            assert!(diff < 1e-9, "{window:?}: {diff}");
        }
    }

    #[test]
    fn test_batched_round_trip() {
        let stft = Stft::new(StftConfig::new().with_sizes(64, 16)).unwrap();
        let x = Array2::from_shape_fn((3, 320), |(c, n)| ((c + 1) as f64 * 0.02 * n as f64).sin());
        let spectrum = stft.forward(&TransformData::from(x.clone())).unwrap();
        assert_eq!(spectrum.shape(), &[3, 21, 33]);
        let back = stft.invert(&spectrum).unwrap();
        assert!(back.max_abs_difference(&TransformData::from(x)).unwrap() < 1e-9);
    }

    #[test]
    fn test_uncentred_interior_reconstruction() {
        let stft = Stft::new(StftConfig::new().with_sizes(64, 16).with_center(false)).unwrap();
        let x = sine(256);
        let spectrum = stft.forward(&TransformData::from(x.clone())).unwrap();
        let back = stft.invert(&spectrum).unwrap().into_real("test").unwrap();
        assert_eq!(back.len(), 256);
        // the first and last samples only meet zero-valued window coefficients
        let diff = max_diff(&back.as_slice().unwrap()[1..255], &x.as_slice().unwrap()[1..255]);
        assert!(diff < 1e-9, "{diff}");
    }

    #[test]
    fn test_wrong_bin_count_rejected() {
        let stft = Stft::new(StftConfig::new().with_sizes(64, 16)).unwrap();
        let spectrum = TransformData::from(Array2::<Complex<f64>>::zeros((4, 10)));
        assert!(stft.invert(&spectrum).is_err());
    }

    #[test]
    fn test_time_channel_follows_frames() {
        let stft = Stft::new(StftConfig::new().with_sizes(64, 16)).unwrap();
        let x = TransformData::from(sine(100));
        let time = Array1::from_shape_fn(100, |n| n as f64 / 100.0).into_dyn();
        let (spectrum, frame_times) = stft.forward_with_time(&x, time).unwrap();
        let frames = spectrum.shape()[0];
        assert_eq!(frame_times.shape(), &[frames]);
        assert_eq!(frame_times[[1]], 0.16);
        assert_eq!(frame_times[[frames - 1]], 0.96);

        let bad_time = Array1::<f64>::zeros(99).into_dyn();
        assert!(stft.forward_with_time(&x, bad_time).is_err());
    }

    #[test]
    fn test_per_item_time_passes_through() {
        let stft = Stft::new(StftConfig::new().with_sizes(64, 16)).unwrap();
        let x = Array2::from_shape_fn((2, 256), |(c, n)| ((c + 1) as f64 * 0.02 * n as f64).sin());
        let time = array![0.5, 1.5].into_dyn();
        let (spectrum, passed) = stft
            .forward_with_time(&TransformData::from(x), time.clone())
            .unwrap();
        assert_eq!(spectrum.shape(), &[2, 17, 33]);
        assert_eq!(passed, time);

        let wrong = Array1::<f64>::zeros(3).into_dyn();
        let err = stft
            .forward_with_time(&TransformData::from(Array2::<f64>::zeros((2, 256))), wrong)
            .unwrap_err();
        assert!(matches!(err, TransformError::DimensionMismatch(_)));
    }
}
