use serde::{Serialize, Deserialize};

use crate::{layers::dense::{Dense, LayerGradients}, optim::Optimizer};

/// Plain mini-batch gradient descent: `p -= lr · g`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Default for Sgd {
    fn default() -> Self {
        Sgd::new(0.01)
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, layers: &mut [Dense], grads: &[LayerGradients]) {
        let lr = self.learning_rate;
        for (layer, grad) in layers.iter_mut().zip(grads.iter()) {
            layer.weights = layer.weights.clone() - grad.weights.scale(lr);
            layer.biases = layer.biases.clone() - grad.biases.scale(lr);
        }
    }
}
