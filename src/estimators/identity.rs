use super::{check_anchors, check_same_width, Estimate, FitInfo};
use crate::error::{Result, TranslateError};
use crate::transforms::check_features;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Passes vectors through unchanged; the "absolute" baseline.
///
/// Fitting only records the shared width so that `apply` can reject batches
/// from a different space.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdentityEstimator {
    n_features: Option<usize>,
}

impl IdentityEstimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Estimate for IdentityEstimator {
    fn name(&self) -> &'static str {
        "IdentityEstimator"
    }

    fn is_fitted(&self) -> bool {
        self.n_features.is_some()
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
        self.n_features = Some(source.ncols());
        Ok(FitInfo::new())
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let n_features = self.n_features.ok_or(TranslateError::NotFitted(self.name()))?;
        check_features(n_features, x.ncols())?;
        Ok(x.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_passthrough() {
        let x = array![[1.0, -2.0], [3.5, 0.0]];
        let mut estimator = IdentityEstimator::new();
        let info = estimator.fit(x.view(), x.view(), 0).unwrap();
        assert!(info.is_empty());
        assert_eq!(estimator.apply(array![[9.0, 8.0]].view()).unwrap(), array![[9.0, 8.0]]);
    }

    #[test]
    fn test_identity_width_checks() {
        let mut estimator = IdentityEstimator::new();
        let result = estimator.fit(array![[1.0, 2.0]].view(), array![[1.0]].view(), 0);
        assert!(matches!(result, Err(TranslateError::DimensionMismatch { .. })));

        let mut estimator = IdentityEstimator::new();
        estimator.fit(array![[1.0]].view(), array![[2.0]].view(), 0).unwrap();
        assert!(estimator.apply(array![[1.0, 2.0]].view()).is_err());
    }
}
