//! Elementary spectral representations.
//!
//! Each representation extracts one real-valued view of a complex spectrum
//! and normalizes it with its own [`Normalize`]:
//!
//! - [`Real`]: real part.
//! - [`Imaginary`]: imaginary part (zeros for real input).
//! - [`Magnitude`]: modulus, optionally mel-projected and contrast-compressed.
//! - [`Phase`]: argument in `(-π, π]`.
//!
//! All of them accept `Real` data as a spectrum with zero imaginary part and
//! reject `Pair` data. Inversion recovers the extracted view, not the full
//! spectrum; [`SpectralRepresentation`](super::spectral::SpectralRepresentation)
//! pairs two of them to rebuild complex data.

use std::fmt;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use super::instantaneous_frequency::InstantaneousFrequency;
use super::mel::MelFilterBank;
use super::normalize::Normalize;
use super::types::{MagnitudeConfig, NormalizationMode};
use crate::traits::{AudioTransform, InversionOptions};
use crate::{TransformData, TransformError, TransformResult};

fn real_part(x: &TransformData, transform: &'static str) -> TransformResult<ArrayD<f64>> {
    match x {
        TransformData::Real(a) => Ok(a.clone()),
        TransformData::Complex(c) => Ok(c.mapv(|v| v.re)),
        other => Err(TransformError::unexpected_data(
            transform,
            "real or complex",
            other.kind(),
        )),
    }
}

fn imaginary_part(x: &TransformData, transform: &'static str) -> TransformResult<ArrayD<f64>> {
    match x {
        TransformData::Real(a) => Ok(ArrayD::zeros(a.raw_dim())),
        TransformData::Complex(c) => Ok(c.mapv(|v| v.im)),
        other => Err(TransformError::unexpected_data(
            transform,
            "real or complex",
            other.kind(),
        )),
    }
}

fn modulus(x: &TransformData, transform: &'static str) -> TransformResult<ArrayD<f64>> {
    match x {
        TransformData::Real(a) => Ok(a.mapv(f64::abs)),
        TransformData::Complex(c) => Ok(c.mapv(|v| v.norm())),
        other => Err(TransformError::unexpected_data(
            transform,
            "real or complex",
            other.kind(),
        )),
    }
}

/// Argument of every element; real input is promoted to complex first.
pub(crate) fn angle(x: &TransformData, transform: &'static str) -> TransformResult<ArrayD<f64>> {
    Ok(x.to_complex(transform)?.mapv(|v| v.arg()))
}

macro_rules! normalized_view {
    ($(#[$meta:meta])* $name:ident, $label:literal, $extract:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            norm: Normalize,
        }

        impl $name {
            /// Creates the representation with the given normalization.
            pub const fn new(mode: NormalizationMode) -> Self {
                Self {
                    norm: Normalize::new(mode),
                }
            }

            /// The owned normalization (and its fitted statistics).
            pub const fn normalization(&self) -> &Normalize {
                &self.norm
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(NormalizationMode::Unipolar)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(norm={})", $label, self.norm.mode())
            }
        }

        impl AudioTransform for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn scriptable(&self) -> bool {
                true
            }

            fn needs_scaling(&self) -> bool {
                self.norm.needs_scaling()
            }

            fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
                self.norm.fit(&$extract(x, $label)?)
            }

            fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
                Ok(TransformData::Real(self.norm.apply(&$extract(x, $label)?)?))
            }

            fn invert_with(
                &self,
                y: &TransformData,
                _options: &InversionOptions,
            ) -> TransformResult<TransformData> {
                Ok(TransformData::Real(self.norm.restore(y.as_real($label)?)?))
            }
        }
    };
}

normalized_view!(
    /// Normalized real part of a spectrum.
    Real,
    "Real",
    real_part
);

normalized_view!(
    /// Normalized phase (argument) of a spectrum.
    Phase,
    "Phase",
    angle
);

/// Normalized imaginary part of a spectrum.
///
/// Real input has no imaginary part: the forward output is then all zeros and
/// is not normalized, so inverting it does not give zeros back unless the
/// statistics were fitted on real input too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imaginary {
    norm: Normalize,
}

impl Imaginary {
    /// Creates the representation with the given normalization.
    pub const fn new(mode: NormalizationMode) -> Self {
        Self {
            norm: Normalize::new(mode),
        }
    }

    /// The owned normalization (and its fitted statistics).
    pub const fn normalization(&self) -> &Normalize {
        &self.norm
    }
}

impl Default for Imaginary {
    fn default() -> Self {
        Self::new(NormalizationMode::Unipolar)
    }
}

impl fmt::Display for Imaginary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imaginary(norm={})", self.norm.mode())
    }
}

impl AudioTransform for Imaginary {
    fn name(&self) -> &'static str {
        "Imaginary"
    }

    fn scriptable(&self) -> bool {
        true
    }

    fn needs_scaling(&self) -> bool {
        self.norm.needs_scaling()
    }

    fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
        self.norm.fit(&imaginary_part(x, "Imaginary")?)
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        match x {
            TransformData::Real(a) => Ok(TransformData::Real(ArrayD::zeros(a.raw_dim()))),
            other => Ok(TransformData::Real(
                self.norm.apply(&imaginary_part(other, "Imaginary")?)?,
            )),
        }
    }

    fn invert_with(
        &self,
        y: &TransformData,
        _options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        Ok(TransformData::Real(self.norm.restore(y.as_real("Imaginary")?)?))
    }
}

/// Spectral magnitude with optional mel projection, contrast and normalization.
///
/// Forward: `|x|` → mel projection → contrast → normalize. Inversion runs the
/// mirror path. With mel projection enabled the round trip is approximate,
/// since the pseudo-inverse cannot restore detail averaged away by the filters.
///
/// # Examples
/// ```rust
/// use audio_transforms::{AudioTransform, Magnitude, NormalizationMode, TransformData};
/// use ndarray::Array2;
///
/// let mut magnitude = Magnitude::linear(NormalizationMode::Unipolar);
/// let spectrum = TransformData::from(Array2::<f64>::zeros((4, 16)));
/// magnitude.scale_data(&spectrum).unwrap();
///
/// let features = magnitude.forward(&spectrum).unwrap();
/// assert!(features.as_real("doc").unwrap().iter().all(|&v| v == 0.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MagnitudeState")]
pub struct Magnitude {
    config: MagnitudeConfig,
    mel_bank: Option<MelFilterBank>,
    norm: Normalize,
}

/// Serialized form of [`Magnitude`], checked against its configuration on load.
#[derive(Deserialize)]
struct MagnitudeState {
    config: MagnitudeConfig,
    #[serde(default)]
    mel_bank: Option<MelFilterBank>,
    norm: Normalize,
}

impl TryFrom<MagnitudeState> for Magnitude {
    type Error = TransformError;

    fn try_from(state: MagnitudeState) -> TransformResult<Self> {
        let MagnitudeState { config, mel_bank, norm } = state;
        if norm.mode() != config.mode {
            return Err(TransformError::configuration(format!(
                "Magnitude normalization is {} but its configuration asks for {}",
                norm.mode(),
                config.mode
            )));
        }
        let mel_bank = match (config.mel, mel_bank) {
            (false, None) => None,
            (false, Some(_)) => {
                return Err(TransformError::configuration(
                    "Magnitude carries a mel bank but mel projection is disabled",
                ));
            }
            (true, None) => {
                tracing::debug!(
                    n_fft = config.n_fft,
                    sample_rate = config.sample_rate,
                    "rebuilding missing mel bank"
                );
                Some(MelFilterBank::new(config.n_fft, config.sample_rate)?)
            }
            (true, Some(bank)) => {
                if bank.n_fft() != config.n_fft || bank.sample_rate() != config.sample_rate {
                    return Err(TransformError::configuration(format!(
                        "mel bank was built for n_fft = {} at {} Hz, configuration asks for n_fft = {} at {} Hz",
                        bank.n_fft(),
                        bank.sample_rate(),
                        config.n_fft,
                        config.sample_rate
                    )));
                }
                Some(bank)
            }
        };
        Ok(Self { config, mel_bank, norm })
    }
}

impl Magnitude {
    /// Builds the representation, constructing the mel bank if requested.
    ///
    /// # Errors
    /// Fails if mel projection is enabled with a zero FFT size or sample rate.
    pub fn new(config: MagnitudeConfig) -> TransformResult<Self> {
        let mel_bank = if config.mel {
            Some(MelFilterBank::new(config.n_fft, config.sample_rate)?)
        } else {
            None
        };
        Ok(Self {
            config,
            mel_bank,
            norm: Normalize::new(config.mode),
        })
    }

    /// Linear-frequency, log1p-compressed magnitude. Needs no mel bank.
    pub const fn linear(mode: NormalizationMode) -> Self {
        Self {
            config: MagnitudeConfig::linear(mode),
            mel_bank: None,
            norm: Normalize::new(mode),
        }
    }

    /// The configuration the representation was built from.
    pub const fn config(&self) -> &MagnitudeConfig {
        &self.config
    }

    /// The mel filter bank, if mel projection is enabled.
    pub const fn mel_bank(&self) -> Option<&MelFilterBank> {
        self.mel_bank.as_ref()
    }

    /// The owned normalization.
    pub const fn normalization(&self) -> &Normalize {
        &self.norm
    }

    /// Magnitude after mel projection and contrast, before normalization.
    pub fn compressed(&self, x: &TransformData) -> TransformResult<ArrayD<f64>> {
        let mut magnitude = modulus(x, "Magnitude")?;
        if let Some(bank) = &self.mel_bank {
            magnitude = bank.project(&magnitude)?;
        }
        let (contrast, eps) = (self.config.contrast, self.config.eps);
        magnitude.mapv_inplace(|m| contrast.apply(m, eps));
        Ok(magnitude)
    }

    /// Undoes contrast and mel projection.
    pub fn expanded(&self, compressed: &ArrayD<f64>) -> TransformResult<ArrayD<f64>> {
        let (contrast, eps) = (self.config.contrast, self.config.eps);
        let magnitude = compressed.mapv(|v| contrast.invert(v, eps));
        match &self.mel_bank {
            Some(bank) => bank.unproject(&magnitude),
            None => Ok(magnitude),
        }
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Magnitude(norm={}, contrast={}",
            self.config.mode, self.config.contrast
        )?;
        if self.config.mel {
            write!(
                f,
                ", mel, n_fft={}, sample_rate={}",
                self.config.n_fft, self.config.sample_rate
            )?;
        }
        f.write_str(")")
    }
}

impl AudioTransform for Magnitude {
    fn name(&self) -> &'static str {
        "Magnitude"
    }

    fn scriptable(&self) -> bool {
        true
    }

    fn needs_scaling(&self) -> bool {
        self.norm.needs_scaling()
    }

    fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
        let compressed = self.compressed(x)?;
        self.norm.fit(&compressed)
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        Ok(TransformData::Real(self.norm.apply(&self.compressed(x)?)?))
    }

    fn invert_with(
        &self,
        y: &TransformData,
        _options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        let compressed = self.norm.restore(y.as_real("Magnitude")?)?;
        Ok(TransformData::Real(self.expanded(&compressed)?))
    }
}

/// One half of a [`SpectralRepresentation`](super::spectral::SpectralRepresentation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Real part.
    Real(Real),
    /// Imaginary part.
    Imaginary(Imaginary),
    /// Magnitude.
    Magnitude(Magnitude),
    /// Phase.
    Phase(Phase),
    /// Instantaneous frequency.
    If(InstantaneousFrequency),
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Real(t) => fmt::Display::fmt(t, f),
            Representation::Imaginary(t) => fmt::Display::fmt(t, f),
            Representation::Magnitude(t) => fmt::Display::fmt(t, f),
            Representation::Phase(t) => fmt::Display::fmt(t, f),
            Representation::If(t) => fmt::Display::fmt(t, f),
        }
    }
}

impl Representation {
    fn inner(&self) -> &dyn AudioTransform {
        match self {
            Representation::Real(t) => t,
            Representation::Imaginary(t) => t,
            Representation::Magnitude(t) => t,
            Representation::Phase(t) => t,
            Representation::If(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AudioTransform {
        match self {
            Representation::Real(t) => t,
            Representation::Imaginary(t) => t,
            Representation::Magnitude(t) => t,
            Representation::Phase(t) => t,
            Representation::If(t) => t,
        }
    }
}

impl AudioTransform for Representation {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn invertible(&self) -> bool {
        self.inner().invertible()
    }

    fn scriptable(&self) -> bool {
        self.inner().scriptable()
    }

    fn needs_scaling(&self) -> bool {
        self.inner().needs_scaling()
    }

    fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
        self.inner_mut().scale_data(x)
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        self.inner().forward(x)
    }

    fn invert_with(
        &self,
        y: &TransformData,
        options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        self.inner().invert_with(y, options)
    }

    fn inversion_modes(&self) -> Option<&'static [&'static str]> {
        self.inner().inversion_modes()
    }
}

impl From<Real> for Representation {
    fn from(value: Real) -> Self {
        Representation::Real(value)
    }
}

impl From<Imaginary> for Representation {
    fn from(value: Imaginary) -> Self {
        Representation::Imaginary(value)
    }
}

impl From<Magnitude> for Representation {
    fn from(value: Magnitude) -> Self {
        Representation::Magnitude(value)
    }
}

impl From<Phase> for Representation {
    fn from(value: Phase) -> Self {
        Representation::Phase(value)
    }
}

impl From<InstantaneousFrequency> for Representation {
    fn from(value: InstantaneousFrequency) -> Self {
        Representation::If(value)
    }
}
