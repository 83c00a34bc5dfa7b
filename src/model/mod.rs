//! Trainable models used by gradient-based estimators.

pub mod state;
pub use state::{Fitted, Unfitted};

pub mod linear;
pub use linear::{LinearModel, LinearParams};

use ndarray::{Array2, ArrayView2};

/// A model that can be trained with a [`Loss`](crate::loss::Loss) and an
/// [`Optimizer`](crate::optimizer::Optimizer).
pub trait TrainableModel {
    type Params;
    type Gradients;
    type Output;

    fn forward(&self, input: ArrayView2<'_, f64>) -> Array2<f64>;
    fn backward(&self, input: ArrayView2<'_, f64>, grad_output: &Array2<f64>) -> Self::Gradients;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Element-wise arithmetic over a parameter set.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: f64) -> Self;
    /// Apply `f` to every scalar parameter.
    fn map(&self, f: impl Fn(f64) -> f64) -> Self;
    /// Combine two parameter sets element by element.
    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self;
}

pub trait InferenceModel {
    fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Array2<f64>;
}
