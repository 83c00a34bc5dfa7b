use crate::model::ParamOps;
use serde::{Deserialize, Serialize};

/// Trait for gradient-based optimizers.
///
/// Optimizers update model parameters from computed gradients; the
/// [`Trainer`](crate::trainer::Trainer) owns the loop.
///
/// # Type Parameters
/// * `P` is the model parameters type (e.g., [`LinearParams`](crate::model::LinearParams))
///
/// # Example
/// ```rust
/// use latent_translate::model::LinearParams;
/// use latent_translate::optimizer::{Optimizer, SGD};
/// use ndarray::array;
///
/// let params = LinearParams { weights: array![[1.0], [2.0]], bias: array![0.5] };
/// let grads = LinearParams { weights: array![[0.1], [-0.2]], bias: array![-0.01] };
/// let mut sgd = SGD::new(0.01);
/// let updated = sgd.step(&params, &grads);
/// assert!((updated.bias[0] - 0.5001).abs() < 1e-12);
/// ```
pub trait Optimizer<P> {
    /// Performs one optimization step and returns the updated parameters.
    ///
    /// Inputs are not mutated; stateful optimizers update only their own moments.
    fn step(&mut self, params: &P, gradients: &P) -> P;
}

/// Stochastic Gradient Descent:
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
#[derive(Clone, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }
}

impl<P: ParamOps> Optimizer<P> for SGD {
    fn step(&mut self, params: &P, grads: &P) -> P {
        params.add(&grads.scale(-self.lr))
    }
}

/// Adam with bias-corrected first and second moment estimates.
///
/// ```text
/// m ← β1·m + (1-β1)·g
/// v ← β2·v + (1-β2)·g²
/// θ ← θ - η · m̂ / (sqrt(v̂) + ε)
/// ```
#[derive(Clone, Debug)]
pub struct Adam<P> {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    moments: Option<(P, P)>,
}

impl<P> Adam<P> {
    /// Adam with the usual defaults `β1 = 0.9`, `β2 = 0.999`, `ε = 1e-8`.
    pub fn new(lr: f64) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            moments: None,
        }
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> i32 {
        self.t
    }
}

impl<P: ParamOps> Optimizer<P> for Adam<P> {
    fn step(&mut self, params: &P, grads: &P) -> P {
        let (beta1, beta2) = (self.beta1, self.beta2);
        let (m, v) = match self.moments.take() {
            Some((m, v)) => (
                m.zip_with(grads, |m, g| beta1 * m + (1.0 - beta1) * g),
                v.zip_with(grads, |v, g| beta2 * v + (1.0 - beta2) * g * g),
            ),
            None => (
                grads.scale(1.0 - beta1),
                grads.map(|g| (1.0 - beta2) * g * g),
            ),
        };
        self.t += 1;

        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);
        let (lr, eps) = (self.lr, self.eps);
        let update = m.zip_with(&v, |m, v| {
            let m_hat = m / bias1;
            let v_hat = v / bias2;
            -lr * m_hat / (v_hat.sqrt() + eps)
        });

        self.moments = Some((m, v));
        params.add(&update)
    }
}

/// Optimizer selection for configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
}
