use crate::error::{Result, TranslateError};
use crate::loss::Loss;
use crate::model::{ParamOps, TrainableModel};
use crate::optimizer::Optimizer;
use ndarray::ArrayView2;
use std::marker::PhantomData;
use tracing::trace;

/// Orchestrates a full-batch training loop for a `TrainableModel`.
///
/// Combines a loss function and an optimizer. Once built via `TrainerBuilder`
/// it is immutable; every call to `fit` starts from a fresh copy of the
/// optimizer, so optimizer state never leaks between models.
pub struct Trainer<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P> + Clone,
{
    pub(crate) steps: usize,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    _phantom_model: PhantomData<M>,
}

/// Fluent builder for constructing a `Trainer`.
///
/// Defaults:
/// - `steps`: 300
pub struct TrainerBuilder<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P> + Clone,
{
    steps: usize,
    loss_fn: L,
    optimizer: O,
    _phantom_model: PhantomData<M>,
}

impl<L, O, M, P> TrainerBuilder<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P> + Clone,
{
    pub fn new(loss_fn: L, optimizer: O) -> Self {
        Self {
            steps: 300,
            loss_fn,
            optimizer,
            _phantom_model: PhantomData,
        }
    }

    /// Number of full-batch gradient steps.
    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, P> {
        Trainer {
            steps: self.steps,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            _phantom_model: PhantomData,
        }
    }
}

/// Result of a training run.
#[derive(Debug)]
pub struct TrainingOutcome<F> {
    pub model: F,
    /// Loss of the last step, measured before its update.
    pub final_loss: f64,
    pub steps: usize,
}

impl<L, O, M, P> Trainer<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P> + Clone,
    P: ParamOps,
{
    pub fn builder(loss_fn: L, optimizer: O) -> TrainerBuilder<L, O, M, P> {
        TrainerBuilder::new(loss_fn, optimizer)
    }

    /// Trains `model` on the whole of `(x, y)` for a fixed number of steps.
    ///
    /// # Errors
    /// - [`TranslateError::EmptyData`] if `x` has no rows
    /// - [`TranslateError::ShapeMismatch`] if `x` and `y` differ in row count
    pub fn fit(
        &self,
        mut model: M,
        x: ArrayView2<'_, f64>,
        y: ArrayView2<'_, f64>,
    ) -> Result<TrainingOutcome<M::Output>> {
        if x.nrows() == 0 {
            return Err(TranslateError::EmptyData("training set is empty".into()));
        }
        if x.nrows() != y.nrows() {
            return Err(TranslateError::ShapeMismatch {
                source_rows: x.nrows(),
                target_rows: y.nrows(),
            });
        }

        let mut optimizer = self.optimizer.clone();
        let mut final_loss = f64::NAN;
        for step in 0..self.steps {
            let preds = model.forward(x);
            let loss = self.loss_fn.loss(&preds, y);
            let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, y);
            let grads = model.backward(x, &grad_preds);

            let new_params = optimizer.step(model.params(), &grads);
            model.update_params(new_params);

            trace!(step, loss, "training step");
            final_loss = loss;
        }

        Ok(TrainingOutcome {
            model: model.into_fitted(),
            final_loss,
            steps: self.steps,
        })
    }
}
