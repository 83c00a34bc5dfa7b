//! L2 row normalization.
//!
//! `apply` divides every row by its own Euclidean norm. `fit` only records the
//! mean row norm of the fitting data, which `reverse` multiplies back in. The
//! per-row norms of the original vectors are not kept, so `reverse` restores
//! the overall scale of the fitted space, not each vector exactly.

use super::{check_features, Transform};
use crate::error::{Result, TranslateError};
use crate::linalg;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Norms below this are treated as this value when dividing.
const NORM_EPS: f64 = 1e-12;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct NormState {
    mean_norm: f64,
    n_features: usize,
}

/// Scales each sample to unit L2 norm.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct L2 {
    state: Option<NormState>,
}

impl L2 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean row norm of the fitting data.
    pub fn mean_norm(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.mean_norm)
    }

    fn fitted_state(&self) -> Result<&NormState> {
        self.state
            .as_ref()
            .ok_or(TranslateError::NotFitted(self.name()))
    }
}

impl Transform for L2 {
    fn name(&self) -> &'static str {
        "L2"
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn fit(&mut self, data: ArrayView2<'_, f64>) -> Result<()> {
        if self.is_fitted() {
            return Err(TranslateError::AlreadyFitted(self.name()));
        }
        if data.nrows() == 0 {
            return Err(TranslateError::EmptyData(
                "cannot fit L2 on empty data".to_string(),
            ));
        }

        let mean_norm = linalg::row_norms(data).mean().unwrap_or(0.0);
        debug!(mean_norm, "fitted L2");
        self.state = Some(NormState {
            mean_norm,
            n_features: data.ncols(),
        });
        Ok(())
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let state = self.fitted_state()?;
        check_features(state.n_features, x.ncols())?;

        let norms = linalg::row_norms(x).mapv(|n| n.max(NORM_EPS));
        Ok(&x / &norms.insert_axis(Axis(1)))
    }

    fn reverse(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let state = self.fitted_state()?;
        check_features(state.n_features, x.ncols())?;
        Ok(&x * state.mean_norm)
    }
}
