//! Supporting types and enums for the transforms.
//!
//! This module contains the mode enums and configuration structures used to
//! build representations. All of them are plain data: they derive serde so a
//! pipeline can be described in a config file, and the enums parse from their
//! snake_case names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TransformError;

/// Scaling applied to a real tensor by [`Normalize`](super::normalize::Normalize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Min-max scaling to `[0, 1]`.
    Unipolar,
    /// Min-max scaling to `[-1, 1]`.
    Bipolar,
    /// Zero mean, unit standard deviation.
    Gaussian,
    /// Identity in both directions. Needs no fitting.
    None,
}

impl NormalizationMode {
    /// Snake-case identifier of the mode.
    pub const fn as_str(&self) -> &'static str {
        match self {
            NormalizationMode::Unipolar => "unipolar",
            NormalizationMode::Bipolar => "bipolar",
            NormalizationMode::Gaussian => "gaussian",
            NormalizationMode::None => "none",
        }
    }
}

impl FromStr for NormalizationMode {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unipolar" => Ok(NormalizationMode::Unipolar),
            "bipolar" => Ok(NormalizationMode::Bipolar),
            "gaussian" => Ok(NormalizationMode::Gaussian),
            "none" => Ok(NormalizationMode::None),
            other => Err(TransformError::configuration(format!(
                "unknown normalization mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compressive nonlinearity applied to magnitudes before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContrastMode {
    /// No compression.
    None,
    /// `ln(max(m, eps))`.
    Log,
    /// `ln(1 + m)`.
    Log1p,
}

impl ContrastMode {
    /// Snake-case identifier of the mode.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContrastMode::None => "none",
            ContrastMode::Log => "log",
            ContrastMode::Log1p => "log1p",
        }
    }

    /// Apply the contrast function to a single magnitude.
    #[inline]
    pub fn apply(&self, magnitude: f64, eps: f64) -> f64 {
        match self {
            ContrastMode::None => magnitude,
            ContrastMode::Log => magnitude.max(eps).ln(),
            ContrastMode::Log1p => magnitude.ln_1p(),
        }
    }

    /// Undo the contrast function for a single value.
    #[inline]
    pub fn invert(&self, value: f64, eps: f64) -> f64 {
        match self {
            ContrastMode::None => value,
            ContrastMode::Log => value.exp() - eps,
            ContrastMode::Log1p => value.exp_m1(),
        }
    }
}

impl FromStr for ContrastMode {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ContrastMode::None),
            "log" => Ok(ContrastMode::Log),
            "log1p" => Ok(ContrastMode::Log1p),
            other => Err(TransformError::configuration(format!(
                "unknown contrast mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ContrastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finite-difference stencil used to turn unwrapped phase into instantaneous frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfMethod {
    /// `p[i+1] - p[i]`, anchored on the last value.
    Forward,
    /// `p[i] - p[i-1]`, anchored on the first value.
    Backward,
    /// `(p[i+1] - p[i-1]) / 2`, anchored on the first value and the last step.
    Central,
}

impl IfMethod {
    /// All stencils, in declaration order.
    pub const ALL: [IfMethod; 3] = [IfMethod::Forward, IfMethod::Backward, IfMethod::Central];

    /// Snake-case identifier of the method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            IfMethod::Forward => "forward",
            IfMethod::Backward => "backward",
            IfMethod::Central => "central",
        }
    }
}

impl FromStr for IfMethod {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(IfMethod::Forward),
            "backward" => Ok(IfMethod::Backward),
            "central" => Ok(IfMethod::Central),
            other => Err(TransformError::configuration(format!(
                "unknown instantaneous frequency method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for IfMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window functions for spectral analysis.
///
/// Different window types provide different trade-offs between frequency resolution
/// and spectral leakage in FFT-based analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Rectangular window (no windowing) - best frequency resolution but high leakage.
    Rectangular,
    /// Hanning window - good general-purpose window with moderate leakage.
    Hanning,
    /// Hamming window - similar to Hanning but slightly different coefficients.
    Hamming,
    /// Blackman window - low leakage but wider main lobe.
    Blackman,
}

impl FromStr for WindowType {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangular" => Ok(WindowType::Rectangular),
            "hanning" | "hann" => Ok(WindowType::Hanning),
            "hamming" => Ok(WindowType::Hamming),
            "blackman" => Ok(WindowType::Blackman),
            other => Err(TransformError::configuration(format!(
                "unknown window type '{other}'"
            ))),
        }
    }
}

/// Configuration for the [`Magnitude`](super::representations::Magnitude) representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeConfig {
    /// Normalization applied last in the forward direction.
    pub mode: NormalizationMode,
    /// Compressive nonlinearity.
    pub contrast: ContrastMode,
    /// Project onto a mel filter bank before compression.
    pub mel: bool,
    /// FFT size the incoming spectra were computed with (mel only).
    pub n_fft: usize,
    /// Sample rate in Hz (mel only).
    pub sample_rate: u32,
    /// Floor used by the `Log` contrast.
    pub eps: f64,
}

impl MagnitudeConfig {
    /// Mel-projected, log1p-compressed, unipolar magnitudes for 1024-point
    /// spectra at 44.1 kHz.
    pub const fn new() -> Self {
        Self {
            mode: NormalizationMode::Unipolar,
            contrast: ContrastMode::Log1p,
            mel: true,
            n_fft: 1024,
            sample_rate: 44100,
            eps: f64::EPSILON,
        }
    }

    /// Linear-frequency magnitudes with log1p compression and the given normalization.
    ///
    /// Exactly invertible, unlike the mel configuration.
    pub const fn linear(mode: NormalizationMode) -> Self {
        Self {
            mode,
            contrast: ContrastMode::Log1p,
            mel: false,
            n_fft: 1024,
            sample_rate: 44100,
            eps: f64::EPSILON,
        }
    }

    /// Set the normalization mode.
    pub const fn with_mode(mut self, mode: NormalizationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the contrast mode.
    pub const fn with_contrast(mut self, contrast: ContrastMode) -> Self {
        self.contrast = contrast;
        self
    }

    /// Enable mel projection for spectra of the given FFT size and sample rate.
    pub const fn with_mel(mut self, n_fft: usize, sample_rate: u32) -> Self {
        self.mel = true;
        self.n_fft = n_fft;
        self.sample_rate = sample_rate;
        self
    }

    /// Disable mel projection.
    pub const fn without_mel(mut self) -> Self {
        self.mel = false;
        self
    }

    /// Set the log floor.
    pub const fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }
}

impl Default for MagnitudeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the [`InstantaneousFrequency`](super::instantaneous_frequency::InstantaneousFrequency) representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IfConfig {
    /// Normalization applied last in the forward direction.
    pub mode: NormalizationMode,
    /// Finite-difference stencil.
    pub method: IfMethod,
    /// Multiply by a triangular window along the differentiation axis.
    pub weighted: bool,
    /// Axis the phase is unwrapped and differentiated along. Negative values
    /// count from the end; the default `-2` is the frames axis of
    /// `(..., frames, bins)` spectra.
    pub axis: isize,
}

impl IfConfig {
    /// Gaussian-normalized, unweighted forward differences along axis `-2`.
    pub const fn new() -> Self {
        Self {
            mode: NormalizationMode::Gaussian,
            method: IfMethod::Forward,
            weighted: false,
            axis: -2,
        }
    }

    /// Set the normalization mode.
    pub const fn with_mode(mut self, mode: NormalizationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the difference stencil.
    pub const fn with_method(mut self, method: IfMethod) -> Self {
        self.method = method;
        self
    }

    /// Enable or disable triangular weighting.
    pub const fn with_weighting(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    /// Set the differentiation axis.
    pub const fn with_axis(mut self, axis: isize) -> Self {
        self.axis = axis;
        self
    }
}

impl Default for IfConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the [`Stft`](super::stft::Stft) transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StftConfig {
    /// FFT size and frame length in samples.
    pub n_fft: usize,
    /// Distance between consecutive frames in samples.
    pub hop_length: usize,
    /// Analysis/synthesis window.
    pub window: WindowType,
    /// Zero-pad `n_fft / 2` samples on both sides so frames are centred.
    pub center: bool,
}

impl StftConfig {
    /// 1024-point frames, hop 256, Hanning window, centred.
    pub const fn new() -> Self {
        Self {
            n_fft: 1024,
            hop_length: 256,
            window: WindowType::Hanning,
            center: true,
        }
    }

    /// Set FFT size and hop length.
    pub const fn with_sizes(mut self, n_fft: usize, hop_length: usize) -> Self {
        self.n_fft = n_fft;
        self.hop_length = hop_length;
        self
    }

    /// Set the window function.
    pub const fn with_window(mut self, window: WindowType) -> Self {
        self.window = window;
        self
    }

    /// Enable or disable centred framing.
    pub const fn with_center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    /// Number of one-sided frequency bins, `n_fft / 2 + 1`.
    pub const fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }
}

impl Default for StftConfig {
    fn default() -> Self {
        Self::new()
    }
}
