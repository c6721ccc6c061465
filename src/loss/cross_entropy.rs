use crate::math::matrix::Matrix;

/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Probabilities are clipped to [EPS, 1 - EPS] before taking the log.
pub const EPS: f64 = 1e-7;

impl CrossEntropyLoss {
    /// Per-sample loss  L = -Σ_i expected[i] · ln(clip(predicted[i]))
    pub fn sample_loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * p.clamp(EPS, 1.0 - EPS).ln())
            .sum()
    }

    /// Mean loss over a batch (one sample per row).
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.rows as f64;
        predicted.data.iter().zip(expected.data.iter())
            .map(|(p, e)| Self::sample_loss(p, e))
            .sum::<f64>() / n
    }

    /// ∂L/∂p for the batch-mean loss: -expected / (clip(predicted) · N).
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.rows as f64;
        Matrix::from_data(
            predicted.data.iter().zip(expected.data.iter())
                .map(|(p, e)| p.iter().zip(e.iter())
                    .map(|(p, e)| -e / (p.clamp(EPS, 1.0 - EPS) * n))
                    .collect())
                .collect(),
        )
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits, averaged over the batch:
    ///   ∂L/∂z = (predicted - expected) / N
    ///
    /// The trainer feeds this straight into `Dense::backward_from_logits` so
    /// the softmax Jacobian is not applied twice.
    pub fn logits_gradient(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.rows as f64;
        (predicted.clone() - expected.clone()).scale(1.0 / n)
    }
}
