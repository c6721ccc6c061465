use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Mean over outputs, then mean over the batch: mean((predicted - expected)²)
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = (predicted.rows * predicted.cols) as f64;
        predicted.data.iter().zip(expected.data.iter())
            .flat_map(|(p, e)| p.iter().zip(e.iter()).map(|(a, b)| (a - b).powi(2)))
            .sum::<f64>() / n
    }

    /// ∂L/∂p: 2 (predicted - expected) / (outputs · N)
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = (predicted.rows * predicted.cols) as f64;
        (predicted.clone() - expected.clone()).scale(2.0 / n)
    }
}
