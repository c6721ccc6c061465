use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Activation functions, serialized under their Keras names so that the
/// same value can be written straight into a TF.js topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationFunction {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    /// Softmax is a vector-valued activation; it is applied per row at the
    /// layer level through `softmax()`.  The element-wise `function()` and
    /// `derivative()` methods are therefore not used for this variant.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation.  For `Softmax`, use `apply_rows()`.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Linear => x,
            ActivationFunction::Relu => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Softmax => {
                panic!("ActivationFunction::Softmax::function() must not be called directly; \
                        use apply_rows() which applies the full-row softmax.")
            }
        }
    }

    /// Element-wise derivative evaluated at the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Linear => 1.0,
            ActivationFunction::Relu => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Softmax => {
                panic!("ActivationFunction::Softmax::derivative() is not element-wise; \
                        use softmax_backward().")
            }
        }
    }

    /// Applies the activation to a batch of pre-activations (one sample per row).
    pub fn apply_rows(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Softmax => z.map_rows(softmax),
            _ => z.map(|x| self.function(x)),
        }
    }
}

/// Numerically stable softmax of a single row.
pub fn softmax(row: &[f64]) -> Vec<f64> {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = row.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Softmax Jacobian-vector product for one row:
///   dz_i = p_i · (g_i − Σ_j g_j p_j)
/// where `p` is the softmax output and `g` is ∂L/∂p.
pub fn softmax_backward(p: &[f64], g: &[f64]) -> Vec<f64> {
    let dot: f64 = p.iter().zip(g.iter()).map(|(p, g)| p * g).sum();
    p.iter().zip(g.iter()).map(|(p, g)| p * (g - dot)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one_for_large_logits() {
        let p = softmax(&[1000.0, 1001.0, 999.0]);
        assert!(p.iter().all(|x| x.is_finite() && *x >= 0.0));
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[1] > p[0] && p[0] > p[2]);
    }

    #[test]
    fn test_relu_and_derivative() {
        let relu = ActivationFunction::Relu;
        assert_eq!(relu.function(-2.0), 0.0);
        assert_eq!(relu.function(3.5), 3.5);
        assert_eq!(relu.derivative(-0.1), 0.0);
        assert_eq!(relu.derivative(0.1), 1.0);
    }

    #[test]
    fn test_softmax_backward_matches_finite_difference() {
        let z = [0.3, -1.2, 0.8];
        let g = [0.5, -0.25, 1.0];
        let p = softmax(&z);
        let analytic = softmax_backward(&p, &g);

        let h = 1e-6;
        for i in 0..z.len() {
            let mut plus = z;
            let mut minus = z;
            plus[i] += h;
            minus[i] -= h;
            let f = |zz: &[f64]| softmax(zz).iter().zip(g.iter()).map(|(p, g)| p * g).sum::<f64>();
            let numeric = (f(&plus) - f(&minus)) / (2.0 * h);
            assert!((numeric - analytic[i]).abs() < 1e-6, "index {}: {} vs {}", i, numeric, analytic[i]);
        }
    }

    #[test]
    fn test_serializes_with_keras_names() {
        assert_eq!(serde_json::to_string(&ActivationFunction::Relu).unwrap(), "\"relu\"");
        assert_eq!(serde_json::to_string(&ActivationFunction::Softmax).unwrap(), "\"softmax\"");
        let linear: ActivationFunction = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(linear, ActivationFunction::Linear);
    }
}
