//! Transform composition.
//!
//! [`Transform`] is the closed set of transforms this crate provides;
//! [`ComposedTransform`] chains them. Composition flattens, so `(a + b) + c`
//! and `a + (b + c)` hold the same three children in the same order.
//!
//! ```rust
//! use audio_transforms::{
//!     AudioTransform, NormalizationMode, SpectralRepresentation, Stft, StftConfig,
//!     TransformData, compose,
//! };
//! use ndarray::Array1;
//!
//! let stft = Stft::new(StftConfig::new().with_sizes(128, 32)).unwrap();
//! let polar = SpectralRepresentation::polar(
//!     NormalizationMode::Unipolar,
//!     NormalizationMode::Gaussian,
//!     Some(-2),
//! );
//! let mut pipeline = compose(stft, polar);
//! assert_eq!(pipeline.len(), 2);
//!
//! let audio = TransformData::from(Array1::from_shape_fn(1024, |n| (0.02 * n as f64).sin()));
//! pipeline.scale_data(&audio).unwrap();
//! let features = pipeline.forward(&audio).unwrap();
//! let rebuilt = pipeline.invert(&features).unwrap();
//! assert!(rebuilt.max_abs_difference(&audio).unwrap() < 1e-6);
//! ```

use std::fmt;
use std::ops::{Add, Index};

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use super::instantaneous_frequency::InstantaneousFrequency;
use super::normalize::Normalize;
use super::representations::{Imaginary, Magnitude, Phase, Real, Representation};
use super::spectral::SpectralRepresentation;
use super::stft::Stft;
use crate::traits::{AudioTransform, InversionOptions};
use crate::{TransformData, TransformError, TransformResult};

/// Pass-through transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity;

impl AudioTransform for Identity {
    fn name(&self) -> &'static str {
        "Identity"
    }

    fn scriptable(&self) -> bool {
        true
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        Ok(x.clone())
    }

    fn invert_with(
        &self,
        y: &TransformData,
        _options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        Ok(y.clone())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity")
    }
}

/// Any transform provided by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Pass-through.
    Identity(Identity),
    /// Standalone normalization.
    Normalize(Normalize),
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
    /// Cartesian, Polar or PolarIF pair.
    Spectral(SpectralRepresentation),
    /// Short-time Fourier transform.
    Stft(Stft),
    /// A chain of transforms.
    Composed(ComposedTransform),
}

impl Transform {
    fn inner(&self) -> &dyn AudioTransform {
        match self {
            Transform::Identity(t) => t,
            Transform::Normalize(t) => t,
            Transform::Real(t) => t,
            Transform::Imaginary(t) => t,
            Transform::Magnitude(t) => t,
            Transform::Phase(t) => t,
            Transform::If(t) => t,
            Transform::Spectral(t) => t,
            Transform::Stft(t) => t,
            Transform::Composed(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AudioTransform {
        match self {
            Transform::Identity(t) => t,
            Transform::Normalize(t) => t,
            Transform::Real(t) => t,
            Transform::Imaginary(t) => t,
            Transform::Magnitude(t) => t,
            Transform::Phase(t) => t,
            Transform::If(t) => t,
            Transform::Spectral(t) => t,
            Transform::Stft(t) => t,
            Transform::Composed(t) => t,
        }
    }
}

impl AudioTransform for Transform {
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

    fn forward_with_time(
        &self,
        x: &TransformData,
        time: ArrayD<f64>,
    ) -> TransformResult<(TransformData, ArrayD<f64>)> {
        self.inner().forward_with_time(x, time)
    }

    fn inversion_modes(&self) -> Option<&'static [&'static str]> {
        self.inner().inversion_modes()
    }
}

/// An ordered chain of transforms.
///
/// `forward` applies the children first to last, `invert` applies their
/// inverses last to first. The flags are derived from the children: the chain
/// is invertible and scriptable only if every child is, and needs scaling if
/// any child does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposedTransform {
    transforms: Vec<Transform>,
}

impl ComposedTransform {
    /// Builds a chain, splicing in the children of nested chains.
    pub fn new<I, T>(transforms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Transform>,
    {
        let mut composed = Self::default();
        for transform in transforms {
            composed.push(transform);
        }
        composed
    }

    /// Appends a transform, splicing in its children if it is itself a chain.
    pub fn push(&mut self, transform: impl Into<Transform>) {
        match transform.into() {
            Transform::Composed(inner) => self.transforms.extend(inner.transforms),
            other => self.transforms.push(other),
        }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the chain has no children (and acts as the identity).
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Child at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Transform> {
        self.transforms.get(index)
    }

    /// Mutable child at `index`, if any.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Transform> {
        self.transforms.get_mut(index)
    }

    /// Child at `index`, or [`TransformError::IndexOutOfRange`].
    pub fn try_get(&self, index: usize) -> TransformResult<&Transform> {
        self.transforms
            .get(index)
            .ok_or(TransformError::IndexOutOfRange {
                index,
                len: self.transforms.len(),
            })
    }

    /// Iterates over the children in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Transform> {
        self.transforms.iter()
    }

    /// The children as a slice.
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Inversion modes offered by the child at `index`.
    pub fn inversion_modes_at(
        &self,
        index: usize,
    ) -> TransformResult<Option<&'static [&'static str]>> {
        Ok(self.try_get(index)?.inversion_modes())
    }

    fn first_non_invertible(&self) -> Option<(usize, &Transform)> {
        self.transforms
            .iter()
            .enumerate()
            .find(|(_, t)| !t.invertible())
    }
}

impl AudioTransform for ComposedTransform {
    fn name(&self) -> &'static str {
        "ComposedTransform"
    }

    fn invertible(&self) -> bool {
        self.transforms.iter().all(AudioTransform::invertible)
    }

    fn scriptable(&self) -> bool {
        self.transforms.iter().all(AudioTransform::scriptable)
    }

    fn needs_scaling(&self) -> bool {
        self.transforms.iter().any(AudioTransform::needs_scaling)
    }

    fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
        tracing::debug!(children = self.transforms.len(), "fitting composed transform");
        let last = self.transforms.len().saturating_sub(1);
        let mut current = x.clone();
        for (index, transform) in self.transforms.iter_mut().enumerate() {
            tracing::trace!(index, transform = transform.name(), "fitting child");
            transform.scale_data(&current)?;
            if index < last {
                current = transform.forward(&current)?;
            }
        }
        Ok(())
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        self.transforms
            .iter()
            .enumerate()
            .try_fold(x.clone(), |current, (index, transform)| {
                tracing::trace!(index, transform = transform.name(), "forward");
                transform.forward(&current)
            })
    }

    fn invert_with(
        &self,
        y: &TransformData,
        options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        if let Some((index, transform)) = self.first_non_invertible() {
            return Err(TransformError::not_invertible(format!(
                "ComposedTransform (child {index}: {})",
                transform.name()
            )));
        }
        self.transforms
            .iter()
            .enumerate()
            .rev()
            .try_fold(y.clone(), |current, (index, transform)| {
                tracing::trace!(index, transform = transform.name(), "invert");
                transform.invert_with(&current, options)
            })
    }

    fn forward_with_time(
        &self,
        x: &TransformData,
        time: ArrayD<f64>,
    ) -> TransformResult<(TransformData, ArrayD<f64>)> {
        self.transforms
            .iter()
            .try_fold((x.clone(), time), |(current, time), transform| {
                transform.forward_with_time(&current, time)
            })
    }
}

impl Index<usize> for ComposedTransform {
    type Output = Transform;

    fn index(&self, index: usize) -> &Self::Output {
        &self.transforms[index]
    }
}

impl<'a> IntoIterator for &'a ComposedTransform {
    type Item = &'a Transform;
    type IntoIter = std::slice::Iter<'a, Transform>;

    fn into_iter(self) -> Self::IntoIter {
        self.transforms.iter()
    }
}

/// Name plus configuration: normalization modes, contrast, mel and STFT
/// sizes, IF method.
impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity(t) => fmt::Display::fmt(t, f),
            Transform::Normalize(t) => fmt::Display::fmt(t, f),
            Transform::Real(t) => fmt::Display::fmt(t, f),
            Transform::Imaginary(t) => fmt::Display::fmt(t, f),
            Transform::Magnitude(t) => fmt::Display::fmt(t, f),
            Transform::Phase(t) => fmt::Display::fmt(t, f),
            Transform::If(t) => fmt::Display::fmt(t, f),
            Transform::Spectral(t) => fmt::Display::fmt(t, f),
            Transform::Stft(t) => fmt::Display::fmt(t, f),
            Transform::Composed(t) => fmt::Display::fmt(t, f),
        }
    }
}

impl fmt::Display for ComposedTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transforms.is_empty() {
            return f.write_str("Identity");
        }
        for (index, transform) in self.transforms.iter().enumerate() {
            if index > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{transform}")?;
        }
        Ok(())
    }
}

/// Chains `first` then `second`.
///
/// Nested chains are flattened, so composition is associative in both the
/// resulting child order and in the results of `forward` and `invert`.
pub fn compose(first: impl Into<Transform>, second: impl Into<Transform>) -> ComposedTransform {
    let mut composed = ComposedTransform::default();
    composed.push(first);
    composed.push(second);
    tracing::debug!(chain = %composed, "composed transforms");
    composed
}

macro_rules! impl_transform_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Transform {
                fn from(value: $ty) -> Self {
                    Transform::$variant(value)
                }
            }

            impl<T: Into<Transform>> Add<T> for $ty {
                type Output = ComposedTransform;

                fn add(self, rhs: T) -> Self::Output {
                    compose(self, rhs)
                }
            }
        )*
    };
}

impl_transform_conversions!(
    Identity => Identity,
    Normalize => Normalize,
    Real => Real,
    Imaginary => Imaginary,
    Magnitude => Magnitude,
    Phase => Phase,
    If => InstantaneousFrequency,
    Spectral => SpectralRepresentation,
    Stft => Stft,
    Composed => ComposedTransform,
);

impl<T: Into<Transform>> Add<T> for Transform {
    type Output = ComposedTransform;

    fn add(self, rhs: T) -> Self::Output {
        compose(self, rhs)
    }
}

impl From<Representation> for Transform {
    fn from(value: Representation) -> Self {
        match value {
            Representation::Real(t) => Transform::Real(t),
            Representation::Imaginary(t) => Transform::Imaginary(t),
            Representation::Magnitude(t) => Transform::Magnitude(t),
            Representation::Phase(t) => Transform::Phase(t),
            Representation::If(t) => Transform::If(t),
        }
    }
}
