//! Instantaneous frequency: the finite-difference derivative of unwrapped phase.
//!
//! The forward pass unwraps the phase along the configured axis, takes an
//! anchored finite difference (see [`crate::utils::phase`]), rescales the
//! difference entries by `π` (or `2π` for the central stencil) and normalizes.
//! Inversion walks the same steps backwards and returns the unwrapped phase.
//!
//! | method   | scaled entries  | divisor |
//! |----------|-----------------|---------|
//! | forward  | all but last    | `π`     |
//! | backward | all but first   | `-π`    |
//! | central  | interior        | `2π`    |

use std::f64::consts::PI;
use std::ops::Range;

use std::fmt;

use ndarray::{Array1, ArrayD, Axis};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::normalize::Normalize;
use super::representations::angle;
use super::types::{IfConfig, IfMethod, NormalizationMode};
use crate::traits::{AudioTransform, InversionOptions};
use crate::utils::phase;
use crate::utils::tensor_ops::resolve_axis;
use crate::{TransformData, TransformError, TransformResult};

/// Triangular weighting window of length `n`:
/// `w[k] = 1.5n / (n² - 1) · (1 - ((k - (n/2 - 1)) / (n/2))²)`.
///
/// Returns all ones for `n < 2`. The last entry is always zero.
pub fn triangular_window(n: usize) -> Array1<f64> {
    if n < 2 {
        return Array1::ones(n);
    }
    let len = n as f64;
    let half = len / 2.0;
    let gain = 1.5 * len / (len * len - 1.0);
    Array1::from_shape_fn(n, |k| {
        let r = (k as f64 - (half - 1.0)) / half;
        gain * (1.0 - r * r)
    })
}

impl IfMethod {
    fn divisor(self) -> f64 {
        match self {
            IfMethod::Forward => PI,
            IfMethod::Backward => -PI,
            IfMethod::Central => 2.0 * PI,
        }
    }

    fn scaled_entries(self, n: usize) -> Range<usize> {
        match self {
            IfMethod::Forward => 0..n - 1,
            IfMethod::Backward => 1..n,
            IfMethod::Central => 1..n - 1,
        }
    }
}

fn rescale(x: &mut ArrayD<f64>, axis: Axis, method: IfMethod, restore: bool) {
    let divisor = method.divisor();
    for mut lane in x.lanes_mut(axis) {
        let n = lane.len();
        if n < 2 {
            continue;
        }
        for i in method.scaled_entries(n) {
            if restore {
                lane[i] *= divisor;
            } else {
                lane[i] /= divisor;
            }
        }
    }
}

/// Instantaneous-frequency representation of a spectrum.
///
/// The method, weighting and axis are fixed at construction; use
/// [`with_method`](Self::with_method) to derive a differently configured
/// instance. Weighted instances are not invertible, because the window's last
/// coefficient is zero and erases each lane's anchor.
///
/// # Examples
/// ```rust
/// use audio_transforms::{AudioTransform, IfConfig, IfMethod, InstantaneousFrequency, TransformData};
/// use ndarray::Array2;
/// use num_complex::Complex;
///
/// let spectrum = TransformData::from(Array2::from_shape_fn((8, 5), |(t, f)| {
///     Complex::from_polar(1.0, 0.3 * (t * (f + 1)) as f64)
/// }));
///
/// let mut inst_f = InstantaneousFrequency::new(IfConfig::new().with_method(IfMethod::Central));
/// inst_f.scale_data(&spectrum).unwrap();
/// let features = inst_f.forward(&spectrum).unwrap();
/// let unwrapped = inst_f.invert(&features).unwrap();
/// assert_eq!(unwrapped.shape(), &[8, 5]);
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct InstantaneousFrequency {
    method: IfMethod,
    weighted: bool,
    axis: isize,
    norm: Normalize,
    #[serde(skip)]
    window: RwLock<Option<Array1<f64>>>,
}

impl fmt::Display for InstantaneousFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF(method={}, norm={}", self.method, self.norm.mode())?;
        if self.weighted {
            f.write_str(", weighted")?;
        }
        f.write_str(")")
    }
}

impl Clone for InstantaneousFrequency {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            weighted: self.weighted,
            axis: self.axis,
            norm: self.norm.clone(),
            window: RwLock::new(self.window.read().clone()),
        }
    }
}

impl Default for InstantaneousFrequency {
    fn default() -> Self {
        Self::new(IfConfig::default())
    }
}

impl InstantaneousFrequency {
    /// Builds an unfitted instance from its configuration.
    pub fn new(config: IfConfig) -> Self {
        Self {
            method: config.method,
            weighted: config.weighted,
            axis: config.axis,
            norm: Normalize::new(config.mode),
            window: RwLock::new(None),
        }
    }

    /// A new unfitted instance identical to this one but for the stencil.
    pub fn with_method(&self, method: IfMethod) -> Self {
        Self::new(self.config().with_method(method))
    }

    /// The configuration this instance was built from.
    pub const fn config(&self) -> IfConfig {
        IfConfig {
            mode: self.norm.mode(),
            method: self.method,
            weighted: self.weighted,
            axis: self.axis,
        }
    }

    /// Finite-difference stencil.
    pub const fn method(&self) -> IfMethod {
        self.method
    }

    /// Whether the triangular window is applied.
    pub const fn weighted(&self) -> bool {
        self.weighted
    }

    /// The owned normalization.
    pub const fn normalization(&self) -> &Normalize {
        &self.norm
    }

    /// Unnormalized instantaneous frequency of a spectrum.
    pub fn instantaneous_frequency(&self, x: &TransformData) -> TransformResult<ArrayD<f64>> {
        let mut inst_f = angle(x, "IF")?;
        let axis = resolve_axis(self.axis, inst_f.ndim())?;

        phase::unwrap(&mut inst_f, axis);
        phase::differentiate(&mut inst_f, axis, self.method);
        rescale(&mut inst_f, axis, self.method, false);

        if self.weighted {
            let window = self.window(inst_f.len_of(axis));
            for mut lane in inst_f.lanes_mut(axis) {
                lane *= &window;
            }
        }
        Ok(inst_f)
    }

    /// Recovers unwrapped phase from an unnormalized instantaneous frequency.
    pub fn integrate(&self, inst_f: &ArrayD<f64>) -> TransformResult<ArrayD<f64>> {
        let axis = resolve_axis(self.axis, inst_f.ndim())?;
        let mut unwrapped = inst_f.clone();
        rescale(&mut unwrapped, axis, self.method, true);
        phase::integrate(&mut unwrapped, axis, self.method);
        Ok(unwrapped)
    }

    fn window(&self, n: usize) -> Array1<f64> {
        if let Some(window) = self.window.read().as_ref().filter(|w| w.len() == n) {
            return window.clone();
        }
        let window = triangular_window(n);
        *self.window.write() = Some(window.clone());
        window
    }
}

impl AudioTransform for InstantaneousFrequency {
    fn name(&self) -> &'static str {
        "IF"
    }

    fn invertible(&self) -> bool {
        !self.weighted
    }

    fn scriptable(&self) -> bool {
        true
    }

    fn needs_scaling(&self) -> bool {
        self.norm.mode() != NormalizationMode::None
    }

    fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
        let inst_f = self.instantaneous_frequency(x)?;
        self.norm.fit(&inst_f)
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        let inst_f = self.instantaneous_frequency(x)?;
        Ok(TransformData::Real(self.norm.apply(&inst_f)?))
    }

    fn invert_with(
        &self,
        y: &TransformData,
        _options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        if self.weighted {
            return Err(TransformError::not_invertible("IF(weighted)"));
        }
        let inst_f = self.norm.restore(y.as_real("IF")?)?;
        Ok(TransformData::Real(self.integrate(&inst_f)?))
    }
}
