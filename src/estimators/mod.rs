//! Estimators that learn a map from a source space into a target space.
//!
//! Every estimator is fitted once on paired anchor batches (row `i` of the
//! source and row `i` of the target describe the same item) and then maps
//! arbitrary source batches with [`Estimate::apply`].
//!
//! | method tag | estimator | map |
//! |------------|-----------|-----|
//! | `svd` | [`SvdEstimator`] | orthogonal Procrustes `x · U·Vᵗ` |
//! | `lstsq` | [`LstsqEstimator`] | least squares `x · M` |
//! | `lstsq+ortho` | [`LstsqOrthoEstimator`] | nearest orthogonal matrix to the least-squares `M` |
//! | `linear` | [`LinearEstimator`] | `x · W + b` trained by gradient descent |
//! | `absolute` | [`IdentityEstimator`] | `x` |

pub mod identity;
pub mod linear;
pub mod lstsq;
pub mod orthogonal;

pub use identity::IdentityEstimator;
pub use linear::{LinearEstimator, LinearEstimatorConfig};
pub use lstsq::LstsqEstimator;
pub use orthogonal::{LstsqOrthoEstimator, SvdEstimator};

use crate::error::{Result, TranslateError};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single diagnostic value reported by a fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InfoValue {
    Count(usize),
    Scalar(f64),
    Text(String),
}

impl InfoValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InfoValue::Count(n) => Some(*n as f64),
            InfoValue::Scalar(x) => Some(*x),
            InfoValue::Text(_) => None,
        }
    }

    pub fn as_count(&self) -> Option<usize> {
        match self {
            InfoValue::Count(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<usize> for InfoValue {
    fn from(n: usize) -> Self {
        InfoValue::Count(n)
    }
}

impl From<f64> for InfoValue {
    fn from(x: f64) -> Self {
        InfoValue::Scalar(x)
    }
}

impl From<&str> for InfoValue {
    fn from(s: &str) -> Self {
        InfoValue::Text(s.to_string())
    }
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Count(n) => write!(f, "{n}"),
            InfoValue::Scalar(x) => write!(f, "{x}"),
            InfoValue::Text(s) => f.write_str(s),
        }
    }
}

/// Diagnostics returned by a fit, keyed by name.
pub type FitInfo = BTreeMap<String, InfoValue>;

/// Fit/apply contract shared by every estimator.
pub trait Estimate {
    fn name(&self) -> &'static str;

    fn is_fitted(&self) -> bool;

    /// Learn the map from `source` to `target`.
    ///
    /// `seed` drives any randomness the estimator needs; deterministic
    /// estimators ignore it.
    ///
    /// # Errors
    /// - [`TranslateError::AlreadyFitted`] on a second call
    /// - [`TranslateError::EmptyData`] when the batches have no rows
    /// - [`TranslateError::ShapeMismatch`] when row counts differ
    fn fit(
        &mut self,
        source: ArrayView2<'_, f64>,
        target: ArrayView2<'_, f64>,
        seed: u64,
    ) -> Result<FitInfo>;

    /// Map source rows into the target space.
    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
}

/// Checks shared by every `fit`: non-empty batches with matching row counts.
pub(crate) fn check_anchors(
    source: ArrayView2<'_, f64>,
    target: ArrayView2<'_, f64>,
) -> Result<()> {
    if source.nrows() != target.nrows() {
        return Err(TranslateError::ShapeMismatch {
            source_rows: source.nrows(),
            target_rows: target.nrows(),
        });
    }
    if source.nrows() == 0 {
        return Err(TranslateError::EmptyData(
            "cannot fit an estimator on zero anchors".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_same_width(
    source: ArrayView2<'_, f64>,
    target: ArrayView2<'_, f64>,
) -> Result<()> {
    if source.ncols() != target.ncols() {
        return Err(TranslateError::DimensionMismatch {
            source_dim: source.ncols(),
            target_dim: target.ncols(),
        });
    }
    Ok(())
}

/// A fitted `x · M` map, shared by the matrix-based estimators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Projection {
    matrix: Array2<f64>,
}

impl Projection {
    pub(crate) fn new(matrix: Array2<f64>) -> Self {
        Self { matrix }
    }

    pub(crate) fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub(crate) fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        crate::transforms::check_features(self.matrix.nrows(), x.ncols())?;
        Ok(x.dot(&self.matrix))
    }
}

/// Tag selecting an estimator, as written in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorMethod {
    #[default]
    #[serde(rename = "svd")]
    Svd,
    #[serde(rename = "lstsq")]
    Lstsq,
    #[serde(rename = "lstsq+ortho")]
    LstsqOrtho,
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "absolute", alias = "identity")]
    Identity,
}

impl EstimatorMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorMethod::Svd => "svd",
            EstimatorMethod::Lstsq => "lstsq",
            EstimatorMethod::LstsqOrtho => "lstsq+ortho",
            EstimatorMethod::Linear => "linear",
            EstimatorMethod::Identity => "absolute",
        }
    }

    /// Build an unfitted estimator with default settings.
    pub fn build(self) -> Estimator {
        match self {
            EstimatorMethod::Svd => SvdEstimator::new().into(),
            EstimatorMethod::Lstsq => LstsqEstimator::new().into(),
            EstimatorMethod::LstsqOrtho => LstsqOrthoEstimator::new().into(),
            EstimatorMethod::Linear => LinearEstimator::new().into(),
            EstimatorMethod::Identity => IdentityEstimator::new().into(),
        }
    }
}

impl fmt::Display for EstimatorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimatorMethod {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svd" => Ok(EstimatorMethod::Svd),
            "lstsq" => Ok(EstimatorMethod::Lstsq),
            "lstsq+ortho" => Ok(EstimatorMethod::LstsqOrtho),
            "linear" => Ok(EstimatorMethod::Linear),
            "absolute" | "identity" => Ok(EstimatorMethod::Identity),
            other => Err(TranslateError::UnsupportedMethod(format!(
                "unknown estimator '{other}'"
            ))),
        }
    }
}

/// Any estimator, as owned by a translator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Estimator {
    Svd(SvdEstimator),
    Lstsq(LstsqEstimator),
    LstsqOrtho(LstsqOrthoEstimator),
    Linear(LinearEstimator),
    Identity(IdentityEstimator),
}

impl Estimator {
    pub fn method(&self) -> EstimatorMethod {
        match self {
            Estimator::Svd(_) => EstimatorMethod::Svd,
            Estimator::Lstsq(_) => EstimatorMethod::Lstsq,
            Estimator::LstsqOrtho(_) => EstimatorMethod::LstsqOrtho,
            Estimator::Linear(_) => EstimatorMethod::Linear,
            Estimator::Identity(_) => EstimatorMethod::Identity,
        }
    }
}

impl Estimate for Estimator {
    fn name(&self) -> &'static str {
        match self {
            Estimator::Svd(e) => e.name(),
            Estimator::Lstsq(e) => e.name(),
            Estimator::LstsqOrtho(e) => e.name(),
            Estimator::Linear(e) => e.name(),
            Estimator::Identity(e) => e.name(),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Estimator::Svd(e) => e.is_fitted(),
            Estimator::Lstsq(e) => e.is_fitted(),
            Estimator::LstsqOrtho(e) => e.is_fitted(),
            Estimator::Linear(e) => e.is_fitted(),
            Estimator::Identity(e) => e.is_fitted(),
        }
    }

    fn fit(
        &mut self,
        source: ArrayView2<'_, f64>,
        target: ArrayView2<'_, f64>,
        seed: u64,
    ) -> Result<FitInfo> {
        match self {
            Estimator::Svd(e) => e.fit(source, target, seed),
            Estimator::Lstsq(e) => e.fit(source, target, seed),
            Estimator::LstsqOrtho(e) => e.fit(source, target, seed),
            Estimator::Linear(e) => e.fit(source, target, seed),
            Estimator::Identity(e) => e.fit(source, target, seed),
        }
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        match self {
            Estimator::Svd(e) => e.apply(x),
            Estimator::Lstsq(e) => e.apply(x),
            Estimator::LstsqOrtho(e) => e.apply(x),
            Estimator::Linear(e) => e.apply(x),
            Estimator::Identity(e) => e.apply(x),
        }
    }
}

impl From<SvdEstimator> for Estimator {
    fn from(e: SvdEstimator) -> Self {
        Estimator::Svd(e)
    }
}

impl From<LstsqEstimator> for Estimator {
    fn from(e: LstsqEstimator) -> Self {
        Estimator::Lstsq(e)
    }
}

impl From<LstsqOrthoEstimator> for Estimator {
    fn from(e: LstsqOrthoEstimator) -> Self {
        Estimator::LstsqOrtho(e)
    }
}

impl From<LinearEstimator> for Estimator {
    fn from(e: LinearEstimator) -> Self {
        Estimator::Linear(e)
    }
}

impl From<IdentityEstimator> for Estimator {
    fn from(e: IdentityEstimator) -> Self {
        Estimator::Identity(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_method_parse() {
        assert_eq!("svd".parse::<EstimatorMethod>().unwrap(), EstimatorMethod::Svd);
        assert_eq!(
            "LSTSQ+ORTHO".parse::<EstimatorMethod>().unwrap(),
            EstimatorMethod::LstsqOrtho
        );
        assert_eq!(
            "absolute".parse::<EstimatorMethod>().unwrap(),
            EstimatorMethod::Identity
        );
        assert_eq!(
            "identity".parse::<EstimatorMethod>().unwrap(),
            EstimatorMethod::Identity
        );
    }

    #[test]
    fn test_method_parse_unknown() {
        assert!(matches!(
            "qr".parse::<EstimatorMethod>(),
            Err(TranslateError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn test_method_display_parses_back() {
        for method in [
            EstimatorMethod::Svd,
            EstimatorMethod::Lstsq,
            EstimatorMethod::LstsqOrtho,
            EstimatorMethod::Linear,
            EstimatorMethod::Identity,
        ] {
            assert_eq!(method.to_string().parse::<EstimatorMethod>().unwrap(), method);
            assert_eq!(method.build().method(), method);
        }
    }

    #[test]
    fn test_method_json() {
        let method: EstimatorMethod = serde_json::from_str("\"lstsq+ortho\"").unwrap();
        assert_eq!(method, EstimatorMethod::LstsqOrtho);
        let method: EstimatorMethod = serde_json::from_str("\"identity\"").unwrap();
        assert_eq!(method, EstimatorMethod::Identity);
        assert_eq!(
            serde_json::to_string(&EstimatorMethod::Identity).unwrap(),
            "\"absolute\""
        );
    }

    #[test]
    fn test_estimator_fit_twice() {
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        for method in [
            EstimatorMethod::Svd,
            EstimatorMethod::Lstsq,
            EstimatorMethod::LstsqOrtho,
            EstimatorMethod::Linear,
            EstimatorMethod::Identity,
        ] {
            let mut estimator = method.build();
            estimator.fit(x.view(), x.view(), 0).unwrap();
            assert!(estimator.is_fitted());
            assert!(
                matches!(
                    estimator.fit(x.view(), x.view(), 0),
                    Err(TranslateError::AlreadyFitted(_))
                ),
                "{method} accepted a second fit"
            );
        }
    }

    #[test]
    fn test_estimator_apply_before_fit() {
        let x = array![[1.0, 0.0]];
        for method in [
            EstimatorMethod::Svd,
            EstimatorMethod::Lstsq,
            EstimatorMethod::LstsqOrtho,
            EstimatorMethod::Linear,
            EstimatorMethod::Identity,
        ] {
            let estimator = method.build();
            assert!(
                matches!(estimator.apply(x.view()), Err(TranslateError::NotFitted(_))),
                "{method} applied before fit"
            );
        }
    }

    #[test]
    fn test_estimator_row_mismatch() {
        let mut estimator = EstimatorMethod::Lstsq.build();
        let source = array![[1.0], [2.0]];
        let target = array![[1.0]];
        assert!(matches!(
            estimator.fit(source.view(), target.view(), 0),
            Err(TranslateError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_estimator_serde_round_trip() {
        let source = array![[1.0, 0.5], [0.0, 1.0], [2.0, -1.0]];
        let target = array![[0.5, 1.0], [1.0, 0.0], [-1.0, 2.0]];
        let mut estimator = EstimatorMethod::Svd.build();
        estimator.fit(source.view(), target.view(), 0).unwrap();

        let bytes = bincode::serialize(&estimator).unwrap();
        let restored: Estimator = bincode::deserialize(&bytes).unwrap();
        assert_eq!(
            restored.apply(source.view()).unwrap(),
            estimator.apply(source.view()).unwrap()
        );
    }

    #[test]
    fn test_info_value_accessors() {
        assert_eq!(InfoValue::from(3usize).as_count(), Some(3));
        assert_eq!(InfoValue::from(0.5).as_f64(), Some(0.5));
        assert_eq!(InfoValue::from("svd").as_f64(), None);
        assert_eq!(InfoValue::from("svd").to_string(), "svd");
    }
}
