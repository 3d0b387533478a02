//! Data-dependent scaling of real tensors.
//!
//! [`Normalize`] owns a [`NormalizationMode`] and the statistics fitted by
//! [`AudioTransform::scale_data`]. Statistics are global to the tensor (one
//! min/max or mean/std pair), and every denominator is clamped to
//! [`NORMALIZATION_EPSILON`] so constant inputs never divide by zero.

use std::fmt;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use super::types::NormalizationMode;
use crate::traits::{AudioTransform, InversionOptions};
use crate::{TransformData, TransformError, TransformResult};

/// Smallest denominator used when scaling.
pub const NORMALIZATION_EPSILON: f64 = f64::EPSILON;

/// Statistics fitted by [`Normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStats {
    /// Value range, used by the unipolar and bipolar modes.
    Range {
        /// Smallest observed value.
        min: f64,
        /// Largest observed value.
        max: f64,
    },
    /// First two moments, used by the gaussian mode.
    Moments {
        /// Mean of the sample.
        mean: f64,
        /// Population standard deviation of the sample.
        std: f64,
    },
}

impl NormalizationStats {
    /// Computes the statistics `mode` needs from `x`. Returns `None` for the
    /// identity mode.
    ///
    /// # Errors
    /// Fails on an empty tensor.
    pub fn fit(mode: NormalizationMode, x: &ArrayD<f64>) -> TransformResult<Option<Self>> {
        if mode == NormalizationMode::None {
            return Ok(None);
        }
        if x.is_empty() {
            return Err(TransformError::invalid_parameter(
                "cannot fit normalization statistics on an empty tensor",
            ));
        }
        let stats = match mode {
            NormalizationMode::Unipolar | NormalizationMode::Bipolar => {
                let (min, max) = x
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                NormalizationStats::Range { min, max }
            }
            NormalizationMode::Gaussian => {
                let n = x.len() as f64;
                let mean = x.sum() / n;
                let variance = x.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
                NormalizationStats::Moments {
                    mean,
                    std: variance.sqrt(),
                }
            }
            NormalizationMode::None => return Ok(None),
        };
        Ok(Some(stats))
    }

    /// Offset and (clamped) scale such that `forward(x) = (x - offset) / scale`.
    fn offset_scale(&self) -> (f64, f64) {
        match *self {
            NormalizationStats::Range { min, max } => (min, (max - min).max(NORMALIZATION_EPSILON)),
            NormalizationStats::Moments { mean, std } => (mean, std.max(NORMALIZATION_EPSILON)),
        }
    }
}

/// Invertible scaling of a real tensor.
///
/// # Examples
/// ```rust
/// use audio_transforms::{AudioTransform, Normalize, NormalizationMode, TransformData};
/// use ndarray::array;
///
/// let data = TransformData::from(array![2.0, 4.0, 6.0]);
/// let mut norm = Normalize::new(NormalizationMode::Unipolar);
/// norm.scale_data(&data).unwrap();
///
/// let scaled = norm.forward(&data).unwrap();
/// assert_eq!(scaled, TransformData::from(array![0.0, 0.5, 1.0]));
/// assert_eq!(norm.invert(&scaled).unwrap(), data);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalize {
    mode: NormalizationMode,
    #[serde(default)]
    stats: Option<NormalizationStats>,
}

impl fmt::Display for Normalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Normalize(mode={})", self.mode)
    }
}

impl Normalize {
    /// Unfitted normalization in the given mode.
    pub const fn new(mode: NormalizationMode) -> Self {
        Self { mode, stats: None }
    }

    /// Pass-through normalization that needs no fitting.
    pub const fn identity() -> Self {
        Self::new(NormalizationMode::None)
    }

    /// Normalization with already known statistics.
    pub const fn with_stats(mode: NormalizationMode, stats: NormalizationStats) -> Self {
        Self {
            mode,
            stats: Some(stats),
        }
    }

    /// The configured mode.
    pub const fn mode(&self) -> NormalizationMode {
        self.mode
    }

    /// The fitted statistics, if any.
    pub const fn stats(&self) -> Option<&NormalizationStats> {
        self.stats.as_ref()
    }

    /// Whether statistics have been fitted (always true for the identity mode).
    pub const fn is_fitted(&self) -> bool {
        matches!(self.mode, NormalizationMode::None) || self.stats.is_some()
    }

    /// Fits statistics on a real tensor, replacing any earlier fit.
    pub fn fit(&mut self, x: &ArrayD<f64>) -> TransformResult<()> {
        self.stats = NormalizationStats::fit(self.mode, x)?;
        if let Some(stats) = &self.stats {
            let (_, scale) = stats.offset_scale();
            if scale <= NORMALIZATION_EPSILON {
                tracing::warn!(mode = %self.mode, "degenerate normalization statistics, denominator clamped");
            }
            tracing::debug!(mode = %self.mode, ?stats, "fitted normalization statistics");
        }
        Ok(())
    }

    /// Scales a real tensor.
    pub fn apply(&self, x: &ArrayD<f64>) -> TransformResult<ArrayD<f64>> {
        if self.mode == NormalizationMode::None {
            return Ok(x.clone());
        }
        let (offset, scale) = self.require_stats()?.offset_scale();
        Ok(match self.mode {
            NormalizationMode::Bipolar => x.mapv(|v| 2.0 * (v - offset) / scale - 1.0),
            _ => x.mapv(|v| (v - offset) / scale),
        })
    }

    /// Undoes [`apply`](Self::apply).
    pub fn restore(&self, x: &ArrayD<f64>) -> TransformResult<ArrayD<f64>> {
        if self.mode == NormalizationMode::None {
            return Ok(x.clone());
        }
        let (offset, scale) = self.require_stats()?.offset_scale();
        Ok(match self.mode {
            NormalizationMode::Bipolar => x.mapv(|v| (v + 1.0) / 2.0 * scale + offset),
            _ => x.mapv(|v| v * scale + offset),
        })
    }

    fn require_stats(&self) -> TransformResult<&NormalizationStats> {
        self.stats
            .as_ref()
            .ok_or(TransformError::NotFitted { transform: "Normalize" })
    }
}

impl AudioTransform for Normalize {
    fn name(&self) -> &'static str {
        "Normalize"
    }

    fn scriptable(&self) -> bool {
        true
    }

    fn needs_scaling(&self) -> bool {
        self.mode != NormalizationMode::None
    }

    fn scale_data(&mut self, x: &TransformData) -> TransformResult<()> {
        self.fit(x.as_real("Normalize")?)
    }

    fn forward(&self, x: &TransformData) -> TransformResult<TransformData> {
        Ok(TransformData::Real(self.apply(x.as_real("Normalize")?)?))
    }

    fn invert_with(
        &self,
        y: &TransformData,
        _options: &InversionOptions,
    ) -> TransformResult<TransformData> {
        Ok(TransformData::Real(self.restore(y.as_real("Normalize")?)?))
    }
}
