use ndarray::{Array2, ArrayView2};

/// A differentiable loss function used during model training.
///
/// Implementors define:
/// - how to compute the scalar loss value (for logging),
/// - how to compute the gradient of the loss w.r.t. the model's predictions.
///
/// The gradient is passed to the model's `backward()` method.
pub trait Loss {
    /// Computes the scalar loss value.
    fn loss(&self, prediction: &Array2<f64>, target: ArrayView2<'_, f64>) -> f64;

    /// Computes the gradient of the loss w.r.t. the prediction: ∂L/∂pred.
    fn grad_wrt_prediction(
        &self,
        prediction: &Array2<f64>,
        target: ArrayView2<'_, f64>,
    ) -> Array2<f64>;
}

/// Mean Squared Error over every element: `L = (1/n) * Σ(pred_i - target_i)^2`
///
/// Gradient w.r.t. prediction: `∂L/∂pred = 2 * (pred - target) / n`, with `n`
/// the total number of elements (rows × output columns).
#[derive(Clone, Copy, Debug, Default)]
pub struct MSELoss;

impl Loss for MSELoss {
    fn loss(&self, pred: &Array2<f64>, target: ArrayView2<'_, f64>) -> f64 {
        let n = pred.len();
        if n == 0 {
            return 0.0;
        }
        let diff = pred - &target;
        diff.iter().map(|d| d * d).sum::<f64>() / n as f64
    }

    fn grad_wrt_prediction(&self, pred: &Array2<f64>, target: ArrayView2<'_, f64>) -> Array2<f64> {
        let n = pred.len().max(1) as f64;
        (pred - &target) * (2.0 / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse_loss() {
        let pred = array![[3.0], [5.0]];
        let target = array![[1.0], [2.0]];

        let mse = MSELoss;
        // ((3-1)^2 + (5-2)^2) / 2 = (4 + 9) / 2 = 6.5
        assert!((mse.loss(&pred, target.view()) - 6.5).abs() < 1e-12);

        // grad = 2 * (pred - target) / n = [2.0, 3.0]
        let grad = mse.grad_wrt_prediction(&pred, target.view());
        assert_eq!(grad, array![[2.0], [3.0]]);
    }

    #[test]
    fn test_mse_loss_multi_output() {
        let pred = array![[1.0, 2.0], [3.0, 4.0]];
        let target = array![[1.0, 0.0], [3.0, 0.0]];

        let mse = MSELoss;
        // (0 + 4 + 0 + 16) / 4
        assert!((mse.loss(&pred, target.view()) - 5.0).abs() < 1e-12);
        let grad = mse.grad_wrt_prediction(&pred, target.view());
        assert_eq!(grad, array![[0.0, 1.0], [0.0, 2.0]]);
    }

    #[test]
    fn test_mse_gradient_matches_finite_difference() {
        let pred = array![[0.3, -1.2], [2.0, 0.7]];
        let target = array![[0.0, -1.0], [1.5, 1.0]];
        let mse = MSELoss;
        let grad = mse.grad_wrt_prediction(&pred, target.view());

        let h = 1e-6;
        let mut bumped = pred.clone();
        bumped[[1, 0]] += h;
        let numeric = (mse.loss(&bumped, target.view()) - mse.loss(&pred, target.view())) / h;
        assert!((numeric - grad[[1, 0]]).abs() < 1e-4);
    }

    #[test]
    fn test_mse_zero_when_equal() {
        let pred = array![[1.0, 2.0]];
        assert_eq!(MSELoss.loss(&pred, pred.view()), 0.0);
    }
}
