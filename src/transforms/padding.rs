//! Zero padding used to reconcile spaces of different dimensionality.

use super::Transform;
use crate::error::{Result, TranslateError};
use crate::linalg;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Appends `pad` zero columns on apply and drops them on reverse.
///
/// Has no learned state; `apply`/`reverse` work without a prior `fit`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ZeroPadding {
    pad: usize,
    fitted: bool,
}

impl ZeroPadding {
    pub fn new(pad: usize) -> Self {
        Self { pad, fitted: false }
    }

    /// Number of zero columns appended.
    pub fn pad(&self) -> usize {
        self.pad
    }
}

impl Transform for ZeroPadding {
    fn name(&self) -> &'static str {
        "ZeroPadding"
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fit(&mut self, _data: ArrayView2<'_, f64>) -> Result<()> {
        if self.fitted {
            return Err(TranslateError::AlreadyFitted(self.name()));
        }
        self.fitted = true;
        Ok(())
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        Ok(linalg::pad_columns(x, self.pad))
    }

    fn reverse(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        linalg::truncate_columns(x, self.pad)
    }

    fn n_features_out(&self, n_features_in: usize) -> usize {
        n_features_in + self.pad
    }
}
