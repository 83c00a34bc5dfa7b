//! Orthogonal estimators: Procrustes via SVD and orthogonalized least squares.

use super::{check_anchors, check_same_width, Estimate, FitInfo, InfoValue, Projection};
use crate::error::{Result, TranslateError};
use crate::linalg;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Singular values at or below this are not counted towards the reported rank.
const RANK_TOLERANCE: f64 = 0.1;

/// Orthogonal Procrustes alignment.
///
/// Fits the rotation `R = U·Vᵗ` from the SVD of `sourceᵀ · target`, which
/// minimizes `‖source · R − target‖_F` over orthogonal `R`. Source and target
/// must have the same width.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SvdEstimator {
    projection: Option<Projection>,
}

impl SvdEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fitted rotation.
    pub fn rotation(&self) -> Option<&Array2<f64>> {
        self.projection.as_ref().map(Projection::matrix)
    }
}

impl Estimate for SvdEstimator {
    fn name(&self) -> &'static str {
        "SvdEstimator"
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
        check_same_width(source, target)?;

        let cross = target.t().dot(&source).reversed_axes();
        let d = linalg::svd(cross.view())?;
        let rotation = d.u.dot(&d.v_t);

        let rank = d
            .singular_values
            .iter()
            .filter(|s| s.abs() > RANK_TOLERANCE)
            .count();
        let sigma_max = d.singular_values.iter().copied().fold(0.0_f64, f64::max);
        let sigma_min = d
            .singular_values
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        debug!(rank, sigma_max, sigma_min, "fitted SVD estimator");

        self.projection = Some(Projection::new(rotation));

        let mut info = FitInfo::new();
        info.insert("rank".into(), InfoValue::Count(rank));
        info.insert("singular_value_max".into(), InfoValue::Scalar(sigma_max));
        info.insert("singular_value_min".into(), InfoValue::Scalar(sigma_min));
        Ok(info)
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.projection
            .as_ref()
            .ok_or(TranslateError::NotFitted(self.name()))?
            .apply(x)
    }
}

/// Least squares followed by projection onto the nearest orthogonal matrix.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LstsqOrthoEstimator {
    projection: Option<Projection>,
}

impl LstsqOrthoEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matrix(&self) -> Option<&Array2<f64>> {
        self.projection.as_ref().map(Projection::matrix)
    }
}

impl Estimate for LstsqOrthoEstimator {
    fn name(&self) -> &'static str {
        "LstsqOrthoEstimator"
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

        let solution = linalg::lstsq(source, target)?;
        let matrix = linalg::nearest_orthogonal(solution.view())?;
        let residual = (&source.dot(&matrix) - &target)
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt();
        debug!(residual, "fitted orthogonalized least-squares estimator");

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
