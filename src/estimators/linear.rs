//! Affine estimator trained with gradient descent.

use super::{check_anchors, Estimate, FitInfo, InfoValue};
use crate::error::{Result, TranslateError};
use crate::loss::MSELoss;
use crate::model::linear::LinearRegression;
use crate::model::{Fitted, InferenceModel, LinearModel, LinearParams};
use crate::optimizer::{Adam, Optimizer, OptimizerKind, SGD};
use crate::trainer::{Trainer, TrainingOutcome};
use crate::transforms::check_features;
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hyperparameters for [`LinearEstimator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearEstimatorConfig {
    /// Number of full-batch gradient steps.
    pub steps: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
}

impl Default for LinearEstimatorConfig {
    fn default() -> Self {
        Self {
            steps: 300,
            learning_rate: 1e-3,
            optimizer: OptimizerKind::Adam,
        }
    }
}

impl LinearEstimatorConfig {
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TranslateError::InvalidParameter(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// `x · W + b` fitted by minimizing the mean squared error to the target.
///
/// Parameters start from a uniform draw seeded by the `seed` passed to
/// [`Estimate::fit`], so equal seeds and inputs give identical parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinearEstimator {
    config: LinearEstimatorConfig,
    model: Option<LinearModel<Fitted>>,
}

impl LinearEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LinearEstimatorConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    pub fn config(&self) -> &LinearEstimatorConfig {
        &self.config
    }

    pub fn params(&self) -> Option<&LinearParams> {
        self.model.as_ref().map(|m| m.params())
    }

    fn train<O>(
        &self,
        optimizer: O,
        model: LinearRegression,
        source: ArrayView2<'_, f64>,
        target: ArrayView2<'_, f64>,
    ) -> Result<TrainingOutcome<LinearModel<Fitted>>>
    where
        O: Optimizer<LinearParams> + Clone,
    {
        Trainer::builder(MSELoss, optimizer)
            .steps(self.config.steps)
            .build()
            .fit(model, source, target)
    }
}

impl Estimate for LinearEstimator {
    fn name(&self) -> &'static str {
        "LinearEstimator"
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn fit(
        &mut self,
        source: ArrayView2<'_, f64>,
        target: ArrayView2<'_, f64>,
        seed: u64,
    ) -> Result<FitInfo> {
        if self.is_fitted() {
            return Err(TranslateError::AlreadyFitted(self.name()));
        }
        check_anchors(source, target)?;
        self.config.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let init = LinearRegression::init_uniform(source.ncols(), target.ncols(), &mut rng)?;
        let lr = self.config.learning_rate;
        let outcome = match self.config.optimizer {
            OptimizerKind::Adam => self.train(Adam::new(lr), init, source, target)?,
            OptimizerKind::Sgd => self.train(SGD::new(lr), init, source, target)?,
        };
        debug!(
            steps = outcome.steps,
            final_loss = outcome.final_loss,
            "fitted linear estimator"
        );

        let mut info = FitInfo::new();
        info.insert("final_loss".into(), InfoValue::Scalar(outcome.final_loss));
        info.insert("steps".into(), InfoValue::Count(outcome.steps));
        self.model = Some(outcome.model);
        Ok(info)
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or(TranslateError::NotFitted(self.name()))?;
        check_features(model.n_features_in(), x.ncols())?;
        Ok(model.predict_batch(x))
    }
}
