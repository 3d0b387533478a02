// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # audio_transforms
//!
//! Invertible feature transforms for audio: reversible mappings between
//! waveforms, complex spectra and the real-valued representations models are
//! trained on (magnitude, phase, instantaneous frequency, real and imaginary
//! parts), together with an algebra for chaining them.
//!
//! Every transform implements [`AudioTransform`]. Transforms carrying
//! normalization statistics are fitted once with
//! [`scale_data`](AudioTransform::scale_data); afterwards `forward` and
//! `invert` are pure functions of their input, and `invert(forward(x))`
//! reproduces `x` within `1e-4` for every invertible transform (lossy cases
//! such as mel projection are documented on the transform).
//!
//! ## Features
//!
//! - `parallel-processing` (default): rayon-backed list helpers in [`batch::parallel`].
//!
//! ## Error Handling
//!
//! All fallible operations return [`TransformResult`]:
//!
//! ```rust
//! use audio_transforms::{AudioTransform, Normalize, NormalizationMode, TransformData, TransformError};
//! use ndarray::array;
//!
//! let norm = Normalize::new(NormalizationMode::Gaussian);
//! match norm.forward(&TransformData::from(array![1.0, 2.0])) {
//!     Err(TransformError::NotFitted { transform }) => assert_eq!(transform, "Normalize"),
//!     other => panic!("unexpected result {other:?}"),
//! }
//! ```
//!
//! ## Quick Start
//!
//! ### Waveform to Polar features and back
//!
//! ```rust
//! use audio_transforms::{
//!     AudioTransform, NormalizationMode, SpectralRepresentation, Stft, StftConfig, TransformData,
//! };
//! use ndarray::Array1;
//!
//! let audio = TransformData::from(Array1::from_shape_fn(2048, |n| (0.01 * n as f64).sin()));
//!
//! let stft = Stft::new(StftConfig::new().with_sizes(256, 64)).unwrap();
//! let polar = SpectralRepresentation::polar(
//!     NormalizationMode::Unipolar,
//!     NormalizationMode::Gaussian,
//!     Some(-2),
//! );
//! let mut pipeline = stft + polar;
//! pipeline.scale_data(&audio).unwrap();
//!
//! let features = pipeline.forward(&audio).unwrap();
//! assert_eq!(features.shape(), &[33, 2, 129]);
//!
//! let rebuilt = pipeline.invert(&features).unwrap();
//! assert!(rebuilt.max_abs_difference(&audio).unwrap() < 1e-6);
//! ```
//!
//! ### Persisting fitted state
//!
//! ```rust
//! use audio_transforms::{AudioTransform, Magnitude, NormalizationMode, Transform, TransformData};
//! use ndarray::Array2;
//!
//! let mut magnitude = Transform::from(Magnitude::linear(NormalizationMode::Bipolar));
//! let spectrum = TransformData::from(Array2::from_shape_fn((4, 8), |(t, f)| (t + f) as f64));
//! magnitude.scale_data(&spectrum).unwrap();
//!
//! let saved = serde_json::to_string(&magnitude).unwrap();
//! let restored: Transform = serde_json::from_str(&saved).unwrap();
//! let before = magnitude.forward(&spectrum).unwrap();
//! let after = restored.forward(&spectrum).unwrap();
//! assert!(before.max_abs_difference(&after).unwrap() < 1e-12);
//! ```

mod error;
mod repr;

pub mod batch;
pub mod operations;
pub mod traits;
pub mod utils;

use num_traits::{Float, FloatConst, NumCast};

pub use crate::error::{TransformError, TransformResult};
pub use crate::operations::{
    ComposedTransform, ContrastMode, Identity, IfConfig, IfMethod, Imaginary,
    InstantaneousFrequency, Magnitude, MagnitudeConfig, MelFilterBank, NormalizationMode,
    NormalizationStats, Normalize, Phase, Real, Representation, SpectralKind,
    SpectralRepresentation, Stft, StftConfig, Transform, WindowType, compose,
};
pub use crate::repr::TransformData;
pub use crate::traits::{AudioTransform, DEFAULT_INVERSION_TOLERANCE, InversionOptions};
pub use crate::utils::audio_math;

/// Marker trait for real floating-point types (f32, f64)
pub trait RealFloat: Float + FloatConst + NumCast + Send + Sync + 'static {}

impl RealFloat for f32 {}
impl RealFloat for f64 {}

/// Converts a numeric value to the floating-point type `F`.
///
/// Used by the generic frequency-scale helpers to lift literals and indices
/// into the working precision without scattering `as` casts.
///
/// # Examples
/// ```
/// use audio_transforms::to_precision;
///
/// let value_f32: f32 = to_precision(42usize);
/// assert_eq!(value_f32, 42.0);
///
/// let value_f64: f64 = to_precision(0.5f32);
/// assert_eq!(value_f64, 0.5);
/// ```
///
/// # Panics
/// Panics if the numeric conversion fails, which cannot happen for the
/// primitive integer and float types.
#[inline(always)]
pub fn to_precision<F, T>(value: T) -> F
where
    F: RealFloat,
    T: NumCast,
{
    NumCast::from(value).expect("safe_cast: valid numeric conversion")
}
