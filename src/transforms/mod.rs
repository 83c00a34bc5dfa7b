//! Reversible, fittable transforms applied around an estimator.
//!
//! Each transform follows the same lifecycle:
//!
//! 1. construct unfitted,
//! 2. [`Transform::fit`] exactly once on the anchor vectors,
//! 3. [`Transform::apply`] / [`Transform::reverse`] as often as needed.
//!
//! A second `fit` fails with [`TranslateError::AlreadyFitted`]. Transforms with
//! learned state fail with [`TranslateError::NotFitted`] when used before
//! `fit`; [`ZeroPadding`] has no learned state and works immediately.
//!
//! # Available Transforms
//!
//! | Transform | apply | reverse |
//! |-----------|-------|---------|
//! | [`Centering`] | `x - mean` | `x + mean` |
//! | [`StandardScaling`] | `(x - mean) / std` | `x * std + mean` |
//! | [`StandardScaling::std_only`] | `x / std` | `x * std` |
//! | [`L2`] | `x / ‖x‖` | `x * mean‖fit‖` (approximate) |
//! | [`ZeroPadding`] | append zeros | drop columns |
//!
//! # Example
//!
//! ```
//! use latent_translate::transforms::{Centering, Transform};
//! use ndarray::array;
//!
//! let anchors = array![[1.0, 2.0], [3.0, 4.0]];
//! let mut centering = Centering::new();
//! let centered = centering.fit_apply(anchors.view()).unwrap();
//! let restored = centering.reverse(centered.view()).unwrap();
//! assert_eq!(restored, anchors);
//! ```

pub mod centering;
pub mod l2;
pub mod padding;
pub mod standard;

pub use centering::Centering;
pub use l2::L2;
pub use padding::ZeroPadding;
pub use standard::{StandardScaling, StandardScalingConfig};

use crate::error::{Result, TranslateError};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A reversible normalization or projection step.
pub trait Transform {
    /// Human-readable step name, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Whether `fit` has been called.
    fn is_fitted(&self) -> bool;

    /// Learn the transform's parameters from `data`.
    ///
    /// # Errors
    /// - [`TranslateError::AlreadyFitted`] on a second call
    /// - [`TranslateError::EmptyData`] when `data` has no rows (learned transforms)
    fn fit(&mut self, data: ArrayView2<'_, f64>) -> Result<()>;

    /// Apply the transform to a batch.
    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Undo the transform on a batch.
    fn reverse(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Fit on `data` and return `data` transformed.
    fn fit_apply(&mut self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.fit(data)?;
        self.apply(data)
    }

    /// Output width for an input of `n_features_in` columns.
    fn n_features_out(&self, n_features_in: usize) -> usize {
        n_features_in
    }
}

pub(crate) fn check_features(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(TranslateError::FeatureMismatch {
            expected_features: expected,
            got_features: got,
        });
    }
    Ok(())
}

/// Any transform, as stored in a translator's source/target chains.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TransformStep {
    Centering(Centering),
    StandardScaling(StandardScaling),
    L2(L2),
    ZeroPadding(ZeroPadding),
}

impl Transform for TransformStep {
    fn name(&self) -> &'static str {
        match self {
            TransformStep::Centering(t) => t.name(),
            TransformStep::StandardScaling(t) => t.name(),
            TransformStep::L2(t) => t.name(),
            TransformStep::ZeroPadding(t) => t.name(),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            TransformStep::Centering(t) => t.is_fitted(),
            TransformStep::StandardScaling(t) => t.is_fitted(),
            TransformStep::L2(t) => t.is_fitted(),
            TransformStep::ZeroPadding(t) => t.is_fitted(),
        }
    }

    fn fit(&mut self, data: ArrayView2<'_, f64>) -> Result<()> {
        match self {
            TransformStep::Centering(t) => t.fit(data),
            TransformStep::StandardScaling(t) => t.fit(data),
            TransformStep::L2(t) => t.fit(data),
            TransformStep::ZeroPadding(t) => t.fit(data),
        }
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        match self {
            TransformStep::Centering(t) => t.apply(x),
            TransformStep::StandardScaling(t) => t.apply(x),
            TransformStep::L2(t) => t.apply(x),
            TransformStep::ZeroPadding(t) => t.apply(x),
        }
    }

    fn reverse(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        match self {
            TransformStep::Centering(t) => t.reverse(x),
            TransformStep::StandardScaling(t) => t.reverse(x),
            TransformStep::L2(t) => t.reverse(x),
            TransformStep::ZeroPadding(t) => t.reverse(x),
        }
    }

    fn n_features_out(&self, n_features_in: usize) -> usize {
        match self {
            TransformStep::ZeroPadding(t) => t.n_features_out(n_features_in),
            _ => n_features_in,
        }
    }
}

impl From<Centering> for TransformStep {
    fn from(t: Centering) -> Self {
        TransformStep::Centering(t)
    }
}

impl From<StandardScaling> for TransformStep {
    fn from(t: StandardScaling) -> Self {
        TransformStep::StandardScaling(t)
    }
}

impl From<L2> for TransformStep {
    fn from(t: L2) -> Self {
        TransformStep::L2(t)
    }
}

impl From<ZeroPadding> for TransformStep {
    fn from(t: ZeroPadding) -> Self {
        TransformStep::ZeroPadding(t)
    }
}

/// Configuration tag for a user-selectable transform.
///
/// Padding is not listed: the translator adds it on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Centering,
    StdScaling,
    StandardScaling,
    L2,
}

impl TransformKind {
    /// Build a fresh, unfitted step of this kind.
    pub fn build(self) -> TransformStep {
        match self {
            TransformKind::Centering => Centering::new().into(),
            TransformKind::StdScaling => StandardScaling::std_only().into(),
            TransformKind::StandardScaling => StandardScaling::new().into(),
            TransformKind::L2 => L2::new().into(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Centering => "centering",
            TransformKind::StdScaling => "std_scaling",
            TransformKind::StandardScaling => "standard_scaling",
            TransformKind::L2 => "l2",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformKind {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "centering" => Ok(TransformKind::Centering),
            "std_scaling" | "stdscaling" => Ok(TransformKind::StdScaling),
            "standard_scaling" | "standardscaling" => Ok(TransformKind::StandardScaling),
            "l2" => Ok(TransformKind::L2),
            other => Err(TranslateError::UnsupportedMethod(format!(
                "unknown transform '{other}'"
            ))),
        }
    }
}
