use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;

/// Selects which loss function the training loop uses.  Serialized under the
/// Keras identifiers (`categorical_crossentropy`, `mean_squared_error`).
///
/// - `CategoricalCrossentropy` — pair with a Softmax output.  With that pairing
///   the trainer uses the combined gradient (predicted - expected) / N.
/// - `MeanSquaredError`        — pair with Linear or Sigmoid output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    CategoricalCrossentropy,
    MeanSquaredError,
}

impl LossType {
    /// Batch-mean loss.
    pub fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        match self {
            LossType::CategoricalCrossentropy => CrossEntropyLoss::loss(predicted, expected),
            LossType::MeanSquaredError => MseLoss::loss(predicted, expected),
        }
    }

    /// ∂L/∂predicted for the batch-mean loss.
    pub fn derivative(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        match self {
            LossType::CategoricalCrossentropy => CrossEntropyLoss::derivative(predicted, expected),
            LossType::MeanSquaredError => MseLoss::derivative(predicted, expected),
        }
    }

    /// When the output activation and this loss combine into a simple
    /// logit gradient, returns ∂L/∂z directly.
    pub fn fused_logits_gradient(
        &self,
        output_activation: ActivationFunction,
        predicted: &Matrix,
        expected: &Matrix,
    ) -> Option<Matrix> {
        match (self, output_activation) {
            (LossType::CategoricalCrossentropy, ActivationFunction::Softmax) => {
                Some(CrossEntropyLoss::logits_gradient(predicted, expected))
            }
            _ => None,
        }
    }
}
