//! Transforms and their supporting types.
//!
//! ## Module Organization
//!
//! - [`types`] - Mode enums and configuration structs
//! - [`normalize`] - Data-dependent scaling
//! - [`representations`] - Real, Imaginary, Magnitude and Phase
//! - [`instantaneous_frequency`] - Phase derivative and its exact integral
//! - [`spectral`] - Cartesian, Polar and PolarIF pairs
//! - [`mel`] - Mel filter bank and pseudo-inverse
//! - [`stft`] - Short-time Fourier transform
//! - [`compose`] - The transform union and composition
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_transforms::operations::*;
//! use audio_transforms::{AudioTransform, TransformData};
//! use ndarray::Array2;
//! use num_complex::Complex;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spectrum = TransformData::from(Array2::from_shape_fn((16, 9), |(t, f)| {
//!     Complex::from_polar(1.0 + f as f64, 0.2 * (t * f) as f64)
//! }));
//!
//! let mut polar_if = SpectralRepresentation::polar_if(
//!     NormalizationMode::Unipolar,
//!     NormalizationMode::Gaussian,
//!     Some(-2),
//! );
//! polar_if.scale_data(&spectrum)?;
//! let features = polar_if.forward(&spectrum)?;
//! assert_eq!(features.shape(), &[16, 2, 9]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod compose;
pub mod instantaneous_frequency;
pub mod mel;
pub mod normalize;
pub mod representations;
pub mod spectral;
pub mod stft;
pub mod types;

#[cfg(test)]
mod tests;

pub use compose::{ComposedTransform, Identity, Transform, compose};
pub use instantaneous_frequency::{InstantaneousFrequency, triangular_window};
pub use mel::MelFilterBank;
pub use normalize::{NORMALIZATION_EPSILON, Normalize, NormalizationStats};
pub use representations::{Imaginary, Magnitude, Phase, Real, Representation};
pub use spectral::{DEFAULT_STACK_AXIS, SpectralKind, SpectralRepresentation};
pub use stft::{Stft, generate_window};
pub use types::{
    ContrastMode, IfConfig, IfMethod, MagnitudeConfig, NormalizationMode, StftConfig, WindowType,
};
