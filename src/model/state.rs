use serde::{Deserialize, Serialize};

/// A marker type indicating that a model is **not yet trained**.
///
/// Used in generic parameters (e.g., `LinearModel<Unfitted>`) so that:
/// - training methods (like `Trainer::fit`) require an `Unfitted` model,
/// - inference methods (`predict_batch`) are not available until the model is `Fitted`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Unfitted;

/// A marker type indicating that a model has been **fully trained**.
///
/// A `Fitted` model contains only inference parameters: no optimizer state,
/// loss function or training hyperparameters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Fitted;
