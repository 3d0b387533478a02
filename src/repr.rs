//! Data representation flowing through transforms.
//!
//! Every transform consumes and produces a [`TransformData`]: a dense real
//! tensor, a dense complex tensor, or a pair of real tensors (the unstacked
//! output of a spectral representation). Spectra are laid out as
//! `(..., frames, bins)`.

use std::borrow::Cow;

use ndarray::{Array, ArrayD, Dimension, Zip};
use num_complex::Complex;

use crate::{TransformError, TransformResult};

/// Tensor value passed between transforms.
///
/// # Examples
/// ```rust
/// use audio_transforms::TransformData;
/// use ndarray::array;
/// use num_complex::Complex;
///
/// let real = TransformData::from(array![[0.1, 0.2], [0.3, 0.4]]);
/// assert_eq!(real.kind(), "real");
/// assert_eq!(real.shape(), &[2, 2]);
///
/// let spectrum = TransformData::from(array![Complex::new(1.0, 1.0)]);
/// assert!(spectrum.is_complex());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TransformData {
    /// Real-valued tensor.
    Real(ArrayD<f64>),
    /// Complex-valued tensor.
    Complex(ArrayD<Complex<f64>>),
    /// Two real tensors of identical shape (magnitude-like, phase-like).
    Pair(ArrayD<f64>, ArrayD<f64>),
}

impl TransformData {
    /// Short name of the data kind, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            TransformData::Real(_) => "real",
            TransformData::Complex(_) => "complex",
            TransformData::Pair(..) => "pair",
        }
    }

    /// Shape of the tensor. For a pair this is the shape of the first element.
    pub fn shape(&self) -> &[usize] {
        match self {
            TransformData::Real(x) => x.shape(),
            TransformData::Complex(x) => x.shape(),
            TransformData::Pair(x, _) => x.shape(),
        }
    }

    /// Returns true for complex-valued data.
    pub const fn is_complex(&self) -> bool {
        matches!(self, TransformData::Complex(_))
    }

    /// Borrows the real tensor, failing for complex or pair data.
    pub fn as_real(&self, transform: &'static str) -> TransformResult<&ArrayD<f64>> {
        match self {
            TransformData::Real(x) => Ok(x),
            other => Err(TransformError::unexpected_data(transform, "real", other.kind())),
        }
    }

    /// Consumes the value and returns the real tensor.
    pub fn into_real(self, transform: &'static str) -> TransformResult<ArrayD<f64>> {
        match self {
            TransformData::Real(x) => Ok(x),
            other => Err(TransformError::unexpected_data(transform, "real", other.kind())),
        }
    }

    /// Borrows the complex tensor, failing for real or pair data.
    pub fn as_complex(&self, transform: &'static str) -> TransformResult<&ArrayD<Complex<f64>>> {
        match self {
            TransformData::Complex(x) => Ok(x),
            other => Err(TransformError::unexpected_data(transform, "complex", other.kind())),
        }
    }

    /// Consumes the value and returns the complex tensor.
    pub fn into_complex(self, transform: &'static str) -> TransformResult<ArrayD<Complex<f64>>> {
        match self {
            TransformData::Complex(x) => Ok(x),
            other => Err(TransformError::unexpected_data(transform, "complex", other.kind())),
        }
    }

    /// Consumes the value and returns the two halves of a pair.
    pub fn into_pair(self, transform: &'static str) -> TransformResult<(ArrayD<f64>, ArrayD<f64>)> {
        match self {
            TransformData::Pair(a, b) => Ok((a, b)),
            other => Err(TransformError::unexpected_data(transform, "pair", other.kind())),
        }
    }

    /// Views the data as a complex tensor. Real data is promoted with a zero
    /// imaginary part; pairs are rejected.
    pub fn to_complex(
        &self,
        transform: &'static str,
    ) -> TransformResult<Cow<'_, ArrayD<Complex<f64>>>> {
        match self {
            TransformData::Complex(x) => Ok(Cow::Borrowed(x)),
            TransformData::Real(x) => Ok(Cow::Owned(x.mapv(|v| Complex::new(v, 0.0)))),
            other => Err(TransformError::unexpected_data(
                transform,
                "real or complex",
                other.kind(),
            )),
        }
    }

    /// Largest absolute element-wise difference between two values of the
    /// same kind and shape. Returns `None` when kinds or shapes differ.
    pub fn max_abs_difference(&self, other: &TransformData) -> Option<f64> {
        match (self, other) {
            (TransformData::Real(a), TransformData::Real(b)) => max_abs_diff(a, b),
            (TransformData::Complex(a), TransformData::Complex(b)) => {
                if a.shape() != b.shape() {
                    return None;
                }
                Some(
                    Zip::from(a)
                        .and(b)
                        .fold(0.0f64, |acc, x, y| acc.max((x - y).norm())),
                )
            }
            (TransformData::Pair(a0, a1), TransformData::Pair(b0, b1)) => {
                Some(max_abs_diff(a0, b0)?.max(max_abs_diff(a1, b1)?))
            }
            _ => None,
        }
    }
}

fn max_abs_diff(a: &ArrayD<f64>, b: &ArrayD<f64>) -> Option<f64> {
    if a.shape() != b.shape() {
        return None;
    }
    Some(
        Zip::from(a)
            .and(b)
            .fold(0.0f64, |acc, x, y| acc.max((x - y).abs())),
    )
}

impl<D: Dimension> From<Array<f64, D>> for TransformData {
    fn from(value: Array<f64, D>) -> Self {
        TransformData::Real(value.into_dyn())
    }
}

impl<D: Dimension> From<Array<Complex<f64>, D>> for TransformData {
    fn from(value: Array<Complex<f64>, D>) -> Self {
        TransformData::Complex(value.into_dyn())
    }
}

impl From<(ArrayD<f64>, ArrayD<f64>)> for TransformData {
    fn from((first, second): (ArrayD<f64>, ArrayD<f64>)) -> Self {
        TransformData::Pair(first, second)
    }
}
