use crate::error::{Result, TranslateError};
use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Weights `(n_features_in, n_features_out)` and bias `(n_features_out)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

impl LinearParams {
    pub fn zeros(n_features_in: usize, n_features_out: usize) -> Self {
        Self {
            weights: Array2::zeros((n_features_in, n_features_out)),
            bias: Array1::zeros(n_features_out),
        }
    }

    pub fn n_features_in(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_features_out(&self) -> usize {
        self.weights.ncols()
    }
}

impl ParamOps for LinearParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: &self.bias + &other.bias,
        }
    }

    fn scale(&self, scalar: f64) -> Self {
        Self {
            weights: &self.weights * scalar,
            bias: &self.bias * scalar,
        }
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            weights: self.weights.mapv(|v| f(v)),
            bias: self.bias.mapv(|v| f(v)),
        }
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            weights: Zip::from(&self.weights)
                .and(&other.weights)
                .map_collect(|&a, &b| f(a, b)),
            bias: Zip::from(&self.bias)
                .and(&other.bias)
                .map_collect(|&a, &b| f(a, b)),
        }
    }
}

/// Affine map `x · W + b`, typed by training state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearModel<S> {
    params: LinearParams,
    _state: PhantomData<S>,
}

impl<S> LinearModel<S> {
    pub fn params(&self) -> &LinearParams {
        &self.params
    }

    fn affine(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        x.dot(&self.params.weights) + &self.params.bias
    }
}

impl LinearModel<Fitted> {
    /// Create a new fitted linear model from params.
    pub fn new(params: LinearParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }

    pub fn n_features_in(&self) -> usize {
        self.params.n_features_in()
    }
}

impl InferenceModel for LinearModel<Fitted> {
    fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Array2<f64> {
        self.affine(input)
    }
}

impl TrainableModel for LinearModel<Unfitted> {
    type Params = LinearParams;
    type Gradients = LinearParams;
    type Output = LinearModel<Fitted>;

    fn forward(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        self.affine(x)
    }

    fn backward(&self, x: ArrayView2<'_, f64>, grad_output: &Array2<f64>) -> LinearParams {
        LinearParams {
            weights: x.t().dot(grad_output),
            bias: grad_output.sum_axis(Axis(0)),
        }
    }

    fn params(&self) -> &LinearParams {
        &self.params
    }

    fn update_params(&mut self, params: LinearParams) {
        self.params = params;
    }

    fn into_fitted(self) -> LinearModel<Fitted> {
        LinearModel::<Fitted>::new(self.params)
    }
}

pub type LinearRegression = LinearModel<Unfitted>;

impl LinearRegression {
    /// Zero-initialized model.
    pub fn zeros(n_features_in: usize, n_features_out: usize) -> Self {
        Self::from_params(LinearParams::zeros(n_features_in, n_features_out))
    }

    /// Weights and bias drawn from `U(-1/sqrt(n_in), 1/sqrt(n_in))`.
    pub fn init_uniform<R: Rng>(
        n_features_in: usize,
        n_features_out: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if n_features_in == 0 || n_features_out == 0 {
            return Err(TranslateError::InvalidParameter(format!(
                "linear model needs non-zero dimensions, got {n_features_in}x{n_features_out}"
            )));
        }
        let bound = 1.0 / (n_features_in as f64).sqrt();
        let weights =
            Array2::from_shape_fn((n_features_in, n_features_out), |_| rng.gen_range(-bound..bound));
        let bias = Array1::from_shape_fn(n_features_out, |_| rng.gen_range(-bound..bound));
        Ok(Self::from_params(LinearParams { weights, bias }))
    }

    pub fn from_params(params: LinearParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}
