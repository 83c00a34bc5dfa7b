//! Centering: subtract the per-dimension mean.
//!
//! ```text
//! apply(x)   = x - mean
//! reverse(x) = x + mean
//! ```

use super::{check_features, Transform};
use crate::error::{Result, TranslateError};
use crate::linalg;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Removes the column mean learned during fit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Centering {
    mean: Option<Array1<f64>>,
}

impl Centering {
    /// Create an unfitted centering transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of each dimension, available after fit.
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    fn fitted_mean(&self) -> Result<&Array1<f64>> {
        self.mean
            .as_ref()
            .ok_or(TranslateError::NotFitted(self.name()))
    }
}

impl Transform for Centering {
    fn name(&self) -> &'static str {
        "Centering"
    }

    fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    fn fit(&mut self, data: ArrayView2<'_, f64>) -> Result<()> {
        if self.is_fitted() {
            return Err(TranslateError::AlreadyFitted(self.name()));
        }
        if data.nrows() == 0 {
            return Err(TranslateError::EmptyData(
                "cannot fit Centering on empty data".to_string(),
            ));
        }

        let mean = linalg::col_mean(data);
        debug!(dims = mean.len(), "fitted Centering");
        self.mean = Some(mean);
        Ok(())
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let mean = self.fitted_mean()?;
        check_features(mean.len(), x.ncols())?;
        Ok(&x - mean)
    }

    fn reverse(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let mean = self.fitted_mean()?;
        check_features(mean.len(), x.ncols())?;
        Ok(&x + mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_data() -> Array2<f64> {
        array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]]
    }

    #[test]
    fn test_centering_fit() {
        let mut centering = Centering::new();
        centering.fit(create_test_data().view()).unwrap();

        let mean = centering.mean().unwrap();
        assert!((mean[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((mean[1] - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_centering_apply_zero_mean() {
        let data = create_test_data();
        let mut centering = Centering::new();
        let centered = centering.fit_apply(data.view()).unwrap();

        let mean = linalg::col_mean(centered.view());
        assert!(mean.iter().all(|m| m.abs() < 1e-12));
    }

    #[test]
    fn test_centering_round_trip() {
        let data = create_test_data();
        let mut centering = Centering::new();
        centering.fit(data.view()).unwrap();

        let x = array![[5.0, -2.0], [0.25, 7.5]];
        let restored = centering
            .reverse(centering.apply(x.view()).unwrap().view())
            .unwrap();
        assert!(linalg::allclose(restored.view(), x.view(), 1e-12, 1e-12));
    }

    #[test]
    fn test_centering_apply_is_idempotent() {
        let data = create_test_data();
        let mut centering = Centering::new();
        centering.fit(data.view()).unwrap();

        let first = centering.apply(data.view()).unwrap();
        let second = centering.apply(data.view()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_centering_not_fitted() {
        let centering = Centering::new();
        let x = create_test_data();
        assert!(matches!(
            centering.apply(x.view()),
            Err(TranslateError::NotFitted("Centering"))
        ));
        assert!(matches!(
            centering.reverse(x.view()),
            Err(TranslateError::NotFitted("Centering"))
        ));
    }

    #[test]
    fn test_centering_fit_twice() {
        let data = create_test_data();
        let mut centering = Centering::new();
        centering.fit(data.view()).unwrap();
        assert!(matches!(
            centering.fit(data.view()),
            Err(TranslateError::AlreadyFitted("Centering"))
        ));
    }

    #[test]
    fn test_centering_empty_data() {
        let data = Array2::<f64>::zeros((0, 3));
        let mut centering = Centering::new();
        assert!(matches!(
            centering.fit(data.view()),
            Err(TranslateError::EmptyData(_))
        ));
    }

    #[test]
    fn test_centering_feature_mismatch() {
        let mut centering = Centering::new();
        centering.fit(create_test_data().view()).unwrap();

        let wrong = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            centering.apply(wrong.view()),
            Err(TranslateError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            })
        ));
    }
}
