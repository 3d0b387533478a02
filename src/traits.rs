//! The transform contract shared by every representation and composition.

use ndarray::ArrayD;

use crate::{TransformData, TransformError, TransformResult};

/// Default tolerance handed to iterative inversion strategies.
pub const DEFAULT_INVERSION_TOLERANCE: f64 = 1.0e-4;

/// Options forwarded to [`AudioTransform::invert_with`].
///
/// `mode` names an alternate inversion strategy (see
/// [`AudioTransform::inversion_modes`]); `None` selects the transform's exact
/// inverse. `tolerance` bounds iterative strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct InversionOptions {
    /// Alternate inversion strategy, if any.
    pub mode: Option<String>,
    /// Convergence tolerance for iterative strategies.
    pub tolerance: f64,
}

impl InversionOptions {
    /// Exact inversion with the default tolerance.
    pub const fn new() -> Self {
        Self {
            mode: None,
            tolerance: DEFAULT_INVERSION_TOLERANCE,
        }
    }

    /// Select a named inversion mode.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Override the tolerance.
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Default for InversionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A reversible mapping between two tensor representations.
///
/// Implementors provide `forward`, and if they are invertible, `invert_with`.
/// Transforms carrying normalization statistics report `needs_scaling() ==
/// true` and must be fitted through [`scale_data`](AudioTransform::scale_data)
/// before use.
///
/// The round-trip contract: for every invertible transform `t`,
/// `t.invert(&t.forward(x)?)?` reproduces `x` within tolerance, except for the
/// lossy cases each transform documents.
pub trait AudioTransform: Send + Sync {
    /// Human readable name, used in diagnostics and errors.
    fn name(&self) -> &'static str;

    /// Whether `invert` is supported.
    fn invertible(&self) -> bool {
        true
    }

    /// Whether the transform is a pure function of its input and state.
    fn scriptable(&self) -> bool {
        false
    }

    /// Whether statistics must be fitted with `scale_data` before use.
    fn needs_scaling(&self) -> bool {
        false
    }

    /// Fit internal statistics on a representative sample. No-op by default.
    fn scale_data(&mut self, _x: &TransformData) -> TransformResult<()> {
        Ok(())
    }

    /// Apply the transform.
    fn forward(&self, x: &TransformData) -> TransformResult<TransformData>;

    /// Invert the transform with explicit options.
    ///
    /// # Errors
    /// Fails with [`TransformError::NotInvertible`] unless overridden.
    fn invert_with(
        &self,
        _y: &TransformData,
        _options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        Err(TransformError::not_invertible(self.name()))
    }

    /// Invert the transform with default options.
    fn invert(&self, y: &TransformData) -> TransformResult<TransformData> {
        self.invert_with(y, &InversionOptions::default())
    }

    /// Apply the transform while carrying an auxiliary time channel.
    ///
    /// Transforms that alter the time axis must override this together with
    /// `forward`; the default passes `time` through untouched.
    fn forward_with_time(
        &self,
        x: &TransformData,
        time: ArrayD<f64>,
    ) -> TransformResult<(TransformData, ArrayD<f64>)> {
        Ok((self.forward(x)?, time))
    }

    /// Names of alternate inversion strategies.
    fn inversion_modes(&self) -> Option<&'static [&'static str]> {
        None
    }
}
