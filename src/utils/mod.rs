//! Numeric helpers shared by the transforms.
//!
//! # Modules
//!
//! - [`audio_math`] - Mel-scale and FFT-bin frequency conversions
//! - [`phase`] - Phase unwrapping and anchored finite differences
//! - [`tensor_ops`] - Axis resolution, last-axis projection, stacking

pub mod audio_math;
pub mod phase;
pub mod tensor_ops;
