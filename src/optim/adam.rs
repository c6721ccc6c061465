use serde::{Serialize, Deserialize};

use crate::{
    layers::dense::{Dense, LayerGradients},
    math::matrix::Matrix,
    optim::Optimizer,
};

/// Adam hyperparameters.  Defaults match Keras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    pub amsgrad: bool,
}

impl Default for AdamConfig {
    fn default() -> Self {
        AdamConfig {
            learning_rate: 0.001,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
            amsgrad: false,
        }
    }
}

/// Moment estimates for one parameter matrix.  `v_max` is the running
/// maximum of `v`, only maintained for AMSGrad.
#[derive(Debug, Clone)]
struct Slot {
    m: Matrix,
    v: Matrix,
    v_max: Matrix,
}

impl Slot {
    fn zeros_like(param: &Matrix) -> Slot {
        let (rows, cols) = param.shape();
        Slot {
            m: Matrix::zeros(rows, cols),
            v: Matrix::zeros(rows, cols),
            v_max: Matrix::zeros(rows, cols),
        }
    }
}

/// Moment estimates for one layer.
#[derive(Debug, Clone)]
struct Moments {
    weights: Slot,
    biases: Slot,
}

impl Moments {
    fn for_layer(layer: &Dense) -> Moments {
        Moments {
            weights: Slot::zeros_like(&layer.weights),
            biases: Slot::zeros_like(&layer.biases),
        }
    }
}

/// Adam with bias correction folded into the step size:
///   lr_t = lr · sqrt(1 − β2^t) / (1 − β1^t)
///   p   -= lr_t · m / (sqrt(v) + ε)
///
/// With `amsgrad` the denominator uses the running maximum of `v` instead,
/// so the effective step size never grows.
///
/// Moment buffers are allocated lazily on the first step, one per layer.
#[derive(Debug, Clone)]
pub struct Adam {
    pub config: AdamConfig,
    iterations: u64,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(config: AdamConfig) -> Adam {
        Adam { config, iterations: 0, moments: Vec::new() }
    }

    /// Number of optimizer steps applied so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(AdamConfig::default())
    }
}

impl Optimizer for Adam {
    fn step(&mut self, layers: &mut [Dense], grads: &[LayerGradients]) {
        if self.moments.len() != layers.len() {
            self.moments = layers.iter().map(Moments::for_layer).collect();
        }
        self.iterations += 1;

        let cfg = &self.config;
        let t = self.iterations as i32;
        let lr_t = cfg.learning_rate * (1.0 - cfg.beta_2.powi(t)).sqrt()
            / (1.0 - cfg.beta_1.powi(t));

        let per_layer = layers.iter_mut().zip(grads.iter()).zip(self.moments.iter_mut());
        for ((layer, grad), moments) in per_layer {
            update(&mut layer.weights, &grad.weights, &mut moments.weights, cfg, lr_t);
            update(&mut layer.biases, &grad.biases, &mut moments.biases, cfg, lr_t);
        }
    }
}

fn update(param: &mut Matrix, grad: &Matrix, slot: &mut Slot, cfg: &AdamConfig, lr_t: f64) {
    for i in 0..param.rows {
        for j in 0..param.cols {
            let g = grad.data[i][j];
            let m = cfg.beta_1 * slot.m.data[i][j] + (1.0 - cfg.beta_1) * g;
            let v = cfg.beta_2 * slot.v.data[i][j] + (1.0 - cfg.beta_2) * g * g;
            slot.m.data[i][j] = m;
            slot.v.data[i][j] = v;

            let denom_v = if cfg.amsgrad {
                let v_max = slot.v_max.data[i][j].max(v);
                slot.v_max.data[i][j] = v_max;
                v_max
            } else {
                v
            };
            param.data[i][j] -= lr_t * m / (denom_v.sqrt() + cfg.epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;

    fn single_weight_layer(w: f64) -> Dense {
        Dense::from_parameters(
            "dense",
            Matrix::from_data(vec![vec![w]]),
            Matrix::zeros(1, 1),
            ActivationFunction::Linear,
        )
    }

    fn grads(w: f64, b: f64) -> LayerGradients {
        LayerGradients {
            weights: Matrix::from_data(vec![vec![w]]),
            biases: Matrix::from_data(vec![vec![b]]),
            input: Matrix::default(),
        }
    }

    #[test]
    fn test_first_step_moves_by_learning_rate_against_gradient() {
        let mut layers = vec![single_weight_layer(1.0)];
        let mut adam = Adam::default();
        adam.step(&mut layers, &[grads(4.0, -0.5)]);

        assert_eq!(adam.iterations(), 1);
        assert!((layers[0].weights.data[0][0] - (1.0 - 0.001)).abs() < 1e-6);
        assert!((layers[0].biases.data[0][0] - 0.001).abs() < 1e-6);
    }

    #[test]
    fn test_zero_gradient_leaves_parameters() {
        let mut layers = vec![single_weight_layer(0.3)];
        let mut adam = Adam::default();
        adam.step(&mut layers, &[grads(0.0, 0.0)]);
        assert_eq!(layers[0].weights.data[0][0], 0.3);
        assert_eq!(layers[0].biases.data[0][0], 0.0);
    }

    #[test]
    fn test_config_defaults_deserialize_from_empty_object() {
        let cfg: AdamConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AdamConfig::default());
    }

    #[test]
    fn test_amsgrad_keeps_step_small_after_gradient_spike() {
        let run = |amsgrad: bool| {
            let mut layers = vec![single_weight_layer(1.0)];
            let mut adam = Adam::new(AdamConfig { amsgrad, beta_2: 0.5, ..AdamConfig::default() });
            for g in [10.0, 0.1, 0.1, 0.1] {
                adam.step(&mut layers, &[grads(g, 0.0)]);
            }
            layers[0].weights.data[0][0]
        };

        let plain = run(false);
        let amsgrad = run(true);
        assert!((plain - amsgrad).abs() > 1e-6, "plain={} amsgrad={}", plain, amsgrad);
        // The remembered spike in v keeps AMSGrad's later steps shorter.
        assert!(amsgrad > plain);
    }
}
