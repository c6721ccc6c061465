use rand::Rng;

use crate::{
    math::matrix::Matrix,
    activation::activation::{ActivationFunction, softmax_backward},
};

/// Gradients of one dense layer for a batch.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    /// ∂L/∂W, shape (input_size, units).
    pub weights: Matrix,
    /// ∂L/∂b, shape (1, units).
    pub biases: Matrix,
    /// ∂L/∂input, shape (batch, input_size); fed to the previous layer.
    pub input: Matrix,
}

/// Fully-connected layer: `a = activation(x·W + b)`.
#[derive(Debug, Clone)]
pub struct Dense {
    pub name: String,
    pub units: usize,
    pub input_size: usize,
    /// Kernel, shape (input_size, units).
    pub weights: Matrix,
    /// Bias row, shape (1, units).
    pub biases: Matrix,
    pub activator: ActivationFunction,
    pre_neurons: Matrix,  // z = xW + b of the last forward pass
    neurons: Matrix,      // a = activation(z) of the last forward pass
}

impl Dense {
    /// Glorot-uniform kernel and zero bias.
    pub fn new<R: Rng + ?Sized>(
        name: impl Into<String>,
        units: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Dense {
        Dense::from_parameters(
            name,
            Matrix::glorot_uniform(input_size, units, rng),
            Matrix::zeros(1, units),
            activation,
        )
    }

    /// Builds a layer around existing parameters (used by the model loader).
    pub fn from_parameters(
        name: impl Into<String>,
        weights: Matrix,
        biases: Matrix,
        activation: ActivationFunction,
    ) -> Dense {
        assert_eq!(biases.rows, 1, "bias must be a single row");
        assert_eq!(weights.cols, biases.cols, "kernel and bias widths differ");
        Dense {
            name: name.into(),
            units: weights.cols,
            input_size: weights.rows,
            pre_neurons: Matrix::default(),
            neurons: Matrix::default(),
            weights,
            biases,
            activator: activation,
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.rows * self.weights.cols + self.biases.cols
    }

    /// Forward pass for a batch; caches z and a for backprop.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let z = (input * &self.weights).add_row(&self.biases);
        let a = self.activator.apply_rows(&z);
        self.pre_neurons = z;
        self.neurons = a.clone();
        a
    }

    /// Activations of the last forward pass.
    pub fn outputs(&self) -> &Matrix {
        &self.neurons
    }

    /// `grad_activations` is ∂L/∂a for this layer.  Applies the activation
    /// derivative and hands the resulting δ = ∂L/∂z to `backward_from_logits`.
    pub fn backward(&self, input: &Matrix, grad_activations: &Matrix) -> LayerGradients {
        let delta = match self.activator {
            ActivationFunction::Softmax => Matrix::from_data(
                self.neurons.data.iter().zip(grad_activations.data.iter())
                    .map(|(p, g)| softmax_backward(p, g))
                    .collect(),
            ),
            _ => {
                let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
                grad_activations.hadamard(&act_derivative)
            }
        };
        self.backward_from_logits(input, &delta)
    }

    /// `delta` is ∂L/∂z (already through the activation), e.g. the combined
    /// softmax + cross-entropy gradient.
    pub fn backward_from_logits(&self, input: &Matrix, delta: &Matrix) -> LayerGradients {
        LayerGradients {
            weights: &input.transpose() * delta,
            biases: delta.sum_rows(),
            input: delta * &self.weights.transpose(),
        }
    }
}
