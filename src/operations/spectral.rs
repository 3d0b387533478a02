//! Two-channel spectral representations: Cartesian, Polar and PolarIF.
//!
//! A [`SpectralRepresentation`] applies a magnitude-like and a phase-like
//! [`Representation`] to the same complex spectrum and stacks the two outputs
//! along a new axis (or returns them as a [`TransformData::Pair`]). Inversion
//! unstacks, inverts both channels and rebuilds the complex spectrum.

use std::fmt;

use ndarray::{ArrayD, Zip};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use super::instantaneous_frequency::InstantaneousFrequency;
use super::representations::{Imaginary, Magnitude, Phase, Real, Representation};
use super::types::{IfConfig, IfMethod, NormalizationMode};
use crate::traits::{AudioTransform, InversionOptions};
use crate::utils::tensor_ops::{split_pair, stack_pair};
use crate::{TransformData, TransformError, TransformResult};

/// Stack axis used by the convenience constructors.
pub const DEFAULT_STACK_AXIS: isize = -2;

/// Which pair of channels a [`SpectralRepresentation`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralKind {
    /// Real and imaginary parts.
    Cartesian,
    /// Magnitude and phase.
    Polar,
    /// Magnitude and instantaneous frequency.
    PolarIf,
}

impl SpectralKind {
    const fn name(self) -> &'static str {
        match self {
            SpectralKind::Cartesian => "Cartesian",
            SpectralKind::Polar => "Polar",
            SpectralKind::PolarIf => "PolarIF",
        }
    }
}

/// A magnitude-like and a phase-like representation applied side by side.
///
/// # Examples
/// ```rust
/// use audio_transforms::{AudioTransform, NormalizationMode, SpectralRepresentation, TransformData};
/// use ndarray::Array2;
/// use num_complex::Complex;
///
/// let spectrum = TransformData::from(Array2::from_elem((3, 5), Complex::new(1.0, 1.0)));
/// let mut cartesian = SpectralRepresentation::cartesian(
///     NormalizationMode::Gaussian,
///     NormalizationMode::Gaussian,
///     Some(-2),
/// );
/// cartesian.scale_data(&spectrum).unwrap();
///
/// let stacked = cartesian.forward(&spectrum).unwrap();
/// assert_eq!(stacked.shape(), &[3, 2, 5]);
///
/// let rebuilt = cartesian.invert(&stacked).unwrap();
/// assert!(rebuilt.max_abs_difference(&spectrum).unwrap() < 1e-9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralRepresentation {
    kind: SpectralKind,
    magnitude: Representation,
    phase: Representation,
    stack: Option<isize>,
}

impl SpectralRepresentation {
    /// Pairs two representations.
    ///
    /// Only `(Real, Imaginary)`, `(Magnitude, Phase)` and `(Magnitude, IF)` can
    /// rebuild a complex spectrum; any other pairing is rejected.
    ///
    /// # Errors
    /// Returns [`TransformError::Configuration`] for unsupported pairings.
    pub fn from_parts(
        magnitude: impl Into<Representation>,
        phase: impl Into<Representation>,
        stack: Option<isize>,
    ) -> TransformResult<Self> {
        let magnitude = magnitude.into();
        let phase = phase.into();
        let kind = match (&magnitude, &phase) {
            (Representation::Real(_), Representation::Imaginary(_)) => SpectralKind::Cartesian,
            (Representation::Magnitude(_), Representation::Phase(_)) => SpectralKind::Polar,
            (Representation::Magnitude(_), Representation::If(_)) => SpectralKind::PolarIf,
            (m, p) => {
                return Err(TransformError::configuration(format!(
                    "cannot build a spectral representation from {} and {}",
                    m.name(),
                    p.name()
                )));
            }
        };
        Ok(Self {
            kind,
            magnitude,
            phase,
            stack,
        })
    }

    /// Real and imaginary parts.
    pub const fn cartesian(
        real_mode: NormalizationMode,
        imaginary_mode: NormalizationMode,
        stack: Option<isize>,
    ) -> Self {
        Self {
            kind: SpectralKind::Cartesian,
            magnitude: Representation::Real(Real::new(real_mode)),
            phase: Representation::Imaginary(Imaginary::new(imaginary_mode)),
            stack,
        }
    }

    /// Linear log1p magnitude and phase.
    pub const fn polar(
        magnitude_mode: NormalizationMode,
        phase_mode: NormalizationMode,
        stack: Option<isize>,
    ) -> Self {
        Self {
            kind: SpectralKind::Polar,
            magnitude: Representation::Magnitude(Magnitude::linear(magnitude_mode)),
            phase: Representation::Phase(Phase::new(phase_mode)),
            stack,
        }
    }

    /// Linear log1p magnitude and forward-difference instantaneous frequency.
    pub fn polar_if(
        magnitude_mode: NormalizationMode,
        if_mode: NormalizationMode,
        stack: Option<isize>,
    ) -> Self {
        Self {
            kind: SpectralKind::PolarIf,
            magnitude: Representation::Magnitude(Magnitude::linear(magnitude_mode)),
            phase: Representation::If(InstantaneousFrequency::new(
                IfConfig::new().with_mode(if_mode),
            )),
            stack,
        }
    }

    /// Replaces the magnitude channel of a Polar or PolarIF representation.
    ///
    /// # Errors
    /// Cartesian representations have no magnitude channel.
    pub fn with_magnitude(mut self, magnitude: Magnitude) -> TransformResult<Self> {
        if self.kind == SpectralKind::Cartesian {
            return Err(TransformError::configuration(
                "a Cartesian representation has no magnitude channel",
            ));
        }
        self.magnitude = Representation::Magnitude(magnitude);
        Ok(self)
    }

    /// Rebuilds the IF channel of a PolarIF representation with another stencil.
    ///
    /// # Errors
    /// Fails unless the phase channel is an instantaneous frequency.
    pub fn with_if_method(mut self, method: IfMethod) -> TransformResult<Self> {
        match &self.phase {
            Representation::If(inst_f) => {
                self.phase = Representation::If(inst_f.with_method(method));
                Ok(self)
            }
            other => Err(TransformError::configuration(format!(
                "{} has no instantaneous frequency channel (found {})",
                self.kind.name(),
                other.name()
            ))),
        }
    }

    /// Which channels this representation holds.
    pub const fn kind(&self) -> SpectralKind {
        self.kind
    }

    /// Stack axis, or `None` when the channels are returned as a pair.
    pub const fn stack(&self) -> Option<isize> {
        self.stack
    }

    /// The magnitude-like channel.
    pub const fn magnitude(&self) -> &Representation {
        &self.magnitude
    }

    /// The phase-like channel.
    pub const fn phase(&self) -> &Representation {
        &self.phase
    }

    fn unstack(&self, y: &TransformData) -> TransformResult<(ArrayD<f64>, ArrayD<f64>)> {
        match self.stack {
            Some(axis) => split_pair(y.as_real(self.kind.name())?, axis),
            None => y.clone().into_pair(self.kind.name()),
        }
    }

    fn rebuild(
        &self,
        first: &ArrayD<f64>,
        second: &ArrayD<f64>,
    ) -> TransformResult<ArrayD<Complex<f64>>> {
        if first.shape() != second.shape() {
            return Err(TransformError::dimension_mismatch(format!(
                "{} channels have shapes {:?} and {:?}",
                self.kind.name(),
                first.shape(),
                second.shape()
            )));
        }
        let zip = Zip::from(first).and(second);
        Ok(match self.kind {
            SpectralKind::Cartesian => zip.map_collect(|&re, &im| Complex::new(re, im)),
            SpectralKind::Polar | SpectralKind::PolarIf => {
                zip.map_collect(|&m, &phi| Complex::from_polar(m, phi))
            }
        })
    }
}

impl fmt::Display for SpectralRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}", self.kind.name(), self.magnitude, self.phase)?;
        match self.stack {
            Some(axis) => write!(f, ", stack={axis})"),
            None => f.write_str(", stack=none)"),
        }
    }
}

impl AudioTransform for SpectralRepresentation {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn invertible(&self) -> bool {
        self.magnitude.invertible() && self.phase.invertible()
    }

    fn scriptable(&self) -> bool {
        self.magnitude.scriptable() && self.phase.scriptable()
    }

    fn needs_scaling(&self) -> bool {
        self.magnitude.needs_scaling() || self.phase.needs_scaling()
    }

    fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
        self.magnitude.scale_data(x)?;
        self.phase.scale_data(x)?;
        tracing::debug!(kind = self.kind.name(), "fitted spectral representation");
        Ok(())
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        let first = self.magnitude.forward(x)?.into_real(self.kind.name())?;
        let second = self.phase.forward(x)?.into_real(self.kind.name())?;
        match self.stack {
            Some(axis) => Ok(TransformData::Real(stack_pair(&first, &second, axis)?)),
            None => Ok(TransformData::Pair(first, second)),
        }
    }

    fn invert_with(
        &self,
        y: &TransformData,
        options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        if !self.invertible() {
            return Err(TransformError::not_invertible(self.kind.name()));
        }
        let (first, second) = self.unstack(y)?;
        let first = self
            .magnitude
            .invert_with(&TransformData::Real(first), options)?
            .into_real(self.kind.name())?;
        let second = self
            .phase
            .invert_with(&TransformData::Real(second), options)?
            .into_real(self.kind.name())?;
        Ok(TransformData::Complex(self.rebuild(&first, &second)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::types::MagnitudeConfig;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn spectrum() -> TransformData {
        TransformData::from(Array2::from_shape_fn((10, 6), |(t, f)| {
            Complex::from_polar(0.5 + 0.1 * f as f64, 0.35 * (f + 1) as f64 * t as f64 - PI / 2.0)
        }))
    }

    #[test]
    fn test_cartesian_uniform_scenario() {
        let x = TransformData::from(Array2::from_elem((4, 3), Complex::new(1.0, 1.0)));
        let mut cartesian = SpectralRepresentation::cartesian(
            NormalizationMode::Gaussian,
            NormalizationMode::Gaussian,
            Some(DEFAULT_STACK_AXIS),
        );
        cartesian.scale_data(&x).unwrap();
        let y = cartesian.forward(&x).unwrap();
        assert_eq!(y.shape(), &[4, 2, 3]);
        assert!(y.as_real("test").unwrap().iter().all(|v| v.abs() < 1e-9));
        let back = cartesian.invert(&y).unwrap();
        assert!(back.max_abs_difference(&x).unwrap() < 1e-4);
    }

    #[test]
    fn test_polar_round_trip_unstacked() {
        let x = spectrum();
        let mut polar = SpectralRepresentation::polar(
            NormalizationMode::Unipolar,
            NormalizationMode::Gaussian,
            None,
        );
        polar.scale_data(&x).unwrap();
        let y = polar.forward(&x).unwrap();
        assert_eq!(y.kind(), "pair");
        assert!(polar.invert(&y).unwrap().max_abs_difference(&x).unwrap() < 1e-9);
    }

    #[test]
    fn test_polar_if_round_trip_every_method() {
        let x = spectrum();
        for method in IfMethod::ALL {
            let mut polar_if = SpectralRepresentation::polar_if(
                NormalizationMode::Unipolar,
                NormalizationMode::Gaussian,
                Some(-1),
            )
            .with_if_method(method)
            .unwrap();
            polar_if.scale_data(&x).unwrap();
            let y = polar_if.forward(&x).unwrap();
            assert_eq!(y.shape(), &[10, 6, 2]);
            let back = polar_if.invert(&y).unwrap();
            assert!(back.max_abs_difference(&x).unwrap() < 1e-9, "{method}");
        }
    }

    #[test]
    fn test_invalid_pairings() {
        let err = SpectralRepresentation::from_parts(
            Phase::default(),
            Magnitude::linear(NormalizationMode::Unipolar),
            None,
        )
        .unwrap_err();
        assert!(err.is_configuration_error());

        assert!(SpectralRepresentation::from_parts(Real::default(), Phase::default(), None).is_err());
        let ok = SpectralRepresentation::from_parts(
            Magnitude::linear(NormalizationMode::Unipolar),
            InstantaneousFrequency::default(),
            Some(-2),
        )
        .unwrap();
        assert_eq!(ok.kind(), SpectralKind::PolarIf);
    }

    #[test]
    fn test_channel_swaps() {
        let cartesian = SpectralRepresentation::cartesian(
            NormalizationMode::Gaussian,
            NormalizationMode::Gaussian,
            None,
        );
        let mel = Magnitude::new(MagnitudeConfig::new()).unwrap();
        assert!(cartesian.clone().with_magnitude(mel.clone()).is_err());
        assert!(cartesian.with_if_method(IfMethod::Central).is_err());

        let polar = SpectralRepresentation::polar(
            NormalizationMode::Unipolar,
            NormalizationMode::Unipolar,
            None,
        )
        .with_magnitude(mel)
        .unwrap();
        assert!(matches!(polar.magnitude(), Representation::Magnitude(m) if m.mel_bank().is_some()));
    }

    #[test]
    fn test_weighted_if_makes_representation_non_invertible() {
        let weighted = InstantaneousFrequency::new(IfConfig::new().with_weighting(true));
        let mut polar_if = SpectralRepresentation::from_parts(
            Magnitude::linear(NormalizationMode::Unipolar),
            weighted,
            Some(-2),
        )
        .unwrap();
        assert!(!polar_if.invertible());
        let x = spectrum();
        polar_if.scale_data(&x).unwrap();
        let y = polar_if.forward(&x).unwrap();
        assert!(polar_if.invert(&y).unwrap_err().is_not_invertible());
    }

    #[test]
    fn test_unstack_rejects_wrong_axis_length() {
        let polar = SpectralRepresentation::polar(
            NormalizationMode::None,
            NormalizationMode::None,
            Some(-2),
        );
        let bogus = TransformData::from(Array2::<f64>::zeros((3, 4)));
        assert!(polar.invert(&bogus).is_err());
    }
}
