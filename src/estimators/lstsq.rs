use super::{check_anchors, Estimate, FitInfo, InfoValue, Projection};
use crate::error::{Result, TranslateError};
use crate::linalg;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unconstrained linear map `M` minimizing `‖target − source · M‖_F`.
///
/// The widths of source and target may differ; `M` is
/// `(source width, target width)`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LstsqEstimator {
    projection: Option<Projection>,
}

impl LstsqEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matrix(&self) -> Option<&Array2<f64>> {
        self.projection.as_ref().map(Projection::matrix)
    }
}

impl Estimate for LstsqEstimator {
    fn name(&self) -> &'static str {
        "LstsqEstimator"
    }

    fn is_fitted(&self) -> bool {
        self.projection.is_some()
    }

    fn fit(
        &mut self,
        source: ArrayView2<'_, f64>,
        target: ArrayView2<'_, f64>,
        _seed: u64,
    ) -> Result<FitInfo> {
        if self.is_fitted() {
            return Err(TranslateError::AlreadyFitted(self.name()));
        }
        check_anchors(source, target)?;

        let matrix = linalg::lstsq(source, target)?;
        let residual = (&source.dot(&matrix) - &target)
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt();
        debug!(residual, "fitted least-squares estimator");

        self.projection = Some(Projection::new(matrix));

        let mut info = FitInfo::new();
        info.insert("residual".into(), InfoValue::Scalar(residual));
        Ok(info)
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.projection
            .as_ref()
            .ok_or(TranslateError::NotFitted(self.name()))?
            .apply(x)
    }
}
