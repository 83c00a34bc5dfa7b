//! Standard scaling (z-score) and std-only scaling.
//!
//! ```text
//! apply(x)   = (x - mean) / std
//! reverse(x) = x * std + mean
//! ```
//!
//! `std` is the sample standard deviation (N - 1 divisor). A dimension whose
//! std is zero up to rounding, or a fit set with fewer than two rows, is scaled by 1 so that
//! constant features pass through unchanged instead of turning into NaN/Inf.
//!
//! With `with_mean(false)` the transform only rescales; this is the
//! `StdScaling` step, meant to follow a separate [`Centering`](super::Centering).

use super::{check_features, Transform};
use crate::error::{Result, TranslateError};
use crate::linalg;
use ndarray::{Array1, Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for [`StandardScaling`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardScalingConfig {
    /// Center the data before scaling.
    pub with_mean: bool,
    /// Scale the data to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalingConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ScaleState {
    mean: Array1<f64>,
    std: Array1<f64>,
}

/// Per-dimension standardization learned from the fitting data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StandardScaling {
    config: StandardScalingConfig,
    state: Option<ScaleState>,
}

impl StandardScaling {
    /// Create an unfitted scaler that centers and scales.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unfitted scaler that only divides by the std.
    pub fn std_only() -> Self {
        Self::new().with_mean(false)
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }

    pub fn config(&self) -> &StandardScalingConfig {
        &self.config
    }

    /// Mean of each dimension (zeros when `with_mean` is off).
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.state.as_ref().map(|s| &s.mean)
    }

    /// Std of each dimension after the zero-std substitution (ones when `with_std` is off).
    pub fn std(&self) -> Option<&Array1<f64>> {
        self.state.as_ref().map(|s| &s.std)
    }

    fn fitted_state(&self) -> Result<&ScaleState> {
        self.state
            .as_ref()
            .ok_or(TranslateError::NotFitted(self.name()))
    }
}

/// A column counts as constant when its std is rounding noise relative to its mean.
fn is_constant(std: f64, mean: f64) -> bool {
    !std.is_finite() || std <= 10.0 * f64::EPSILON * mean.abs().max(1.0)
}

impl Transform for StandardScaling {
    fn name(&self) -> &'static str {
        if self.config.with_mean {
            "StandardScaling"
        } else {
            "StdScaling"
        }
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn fit(&mut self, data: ArrayView2<'_, f64>) -> Result<()> {
        if self.is_fitted() {
            return Err(TranslateError::AlreadyFitted(self.name()));
        }
        let (rows, cols) = data.dim();
        if rows == 0 {
            return Err(TranslateError::EmptyData(format!(
                "cannot fit {} on empty data",
                self.name()
            )));
        }

        let mean = if self.config.with_mean {
            linalg::col_mean(data)
        } else {
            Array1::zeros(cols)
        };

        let std = if self.config.with_std {
            let raw = linalg::col_std(data, 1);
            let centers = linalg::col_mean(data);
            let mut degenerate = 0usize;
            let std = Zip::from(&raw)
                .and(&centers)
                .map_collect(|&s, &m| {
                    if is_constant(s, m) {
                        degenerate += 1;
                        1.0
                    } else {
                        s
                    }
                });
            if degenerate > 0 {
                warn!(
                    transform = self.name(),
                    columns = degenerate,
                    "zero standard deviation, scaling those dimensions by 1"
                );
            }
            std
        } else {
            Array1::ones(cols)
        };

        debug!(transform = self.name(), dims = cols, "fitted scaling");
        self.state = Some(ScaleState { mean, std });
        Ok(())
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let state = self.fitted_state()?;
        check_features(state.mean.len(), x.ncols())?;

        let mut out = x.to_owned();
        if self.config.with_mean {
            out -= &state.mean;
        }
        if self.config.with_std {
            out /= &state.std;
        }
        Ok(out)
    }

    fn reverse(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let state = self.fitted_state()?;
        check_features(state.mean.len(), x.ncols())?;

        let mut out = x.to_owned();
        if self.config.with_std {
            out *= &state.std;
        }
        if self.config.with_mean {
            out += &state.mean;
        }
        Ok(out)
    }
}
