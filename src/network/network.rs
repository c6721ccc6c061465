use rand::Rng;

use crate::{
    activation::activation::ActivationFunction,
    error::{Error, Result},
    layers::dense::Dense,
    math::matrix::Matrix,
};

/// A sequential stack of dense layers.
#[derive(Debug, Clone)]
pub struct Network {
    input_size: usize,
    pub layers: Vec<Dense>,
}

impl Network {
    /// Empty network accepting `input_size` features per sample.
    pub fn new(input_size: usize) -> Network {
        Network { input_size, layers: Vec::new() }
    }

    /// Appends a dense layer fed by the previous layer (or the input).
    /// Layers are named the way Keras names them: `dense`, `dense_1`, ...
    pub fn add_dense<R: Rng + ?Sized>(
        &mut self,
        units: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> &mut Self {
        let name = dense_name(self.layers.len());
        let layer = Dense::new(name, units, self.output_size(), activation, rng);
        self.layers.push(layer);
        self
    }

    /// Appends an already-built layer; its input width must match.
    pub fn push_layer(&mut self, layer: Dense) -> Result<()> {
        if layer.input_size != self.output_size() {
            return Err(Error::ShapeMismatch {
                expected: (self.output_size(), layer.units),
                actual: (layer.input_size, layer.units),
            });
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Width of the last layer (the input width for an empty network).
    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.units).unwrap_or(self.input_size)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    /// Batch forward pass; stores activations in each layer for backprop.
    ///
    /// # Panics
    /// Panics if `input.cols != self.input_size()`.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        assert_eq!(input.cols, self.input_size, "input width does not match the network");
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Single-sample prediction.
    pub fn predict(&mut self, sample: &[f64]) -> Result<Vec<f64>> {
        if sample.len() != self.input_size {
            return Err(Error::ShapeMismatch {
                expected: (1, self.input_size),
                actual: (1, sample.len()),
            });
        }
        let out = self.forward(&Matrix::from_data(vec![sample.to_vec()]));
        Ok(out.data.into_iter().next().unwrap_or_default())
    }
}

fn dense_name(index: usize) -> String {
    if index == 0 {
        "dense".to_owned()
    } else {
        format!("dense_{}", index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn demo_network(seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut network = Network::new(4);
        network
            .add_dense(32, ActivationFunction::Relu, &mut rng)
            .add_dense(3, ActivationFunction::Softmax, &mut rng);
        network
    }

    #[test]
    fn test_layers_are_named_and_chained() {
        let network = demo_network(0);
        let names: Vec<&str> = network.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["dense", "dense_1"]);
        assert_eq!(network.layers[1].input_size, 32);
        assert_eq!(network.output_size(), 3);
        assert_eq!(network.parameter_count(), 4 * 32 + 32 + 32 * 3 + 3);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let mut network = demo_network(0);
        assert!(matches!(network.predict(&[0.1, 0.2]), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_push_layer_rejects_mismatched_input() {
        let mut network = Network::new(4);
        let layer = Dense::from_parameters(
            "dense",
            Matrix::zeros(5, 2),
            Matrix::zeros(1, 2),
            ActivationFunction::Linear,
        );
        assert!(network.push_layer(layer).is_err());
    }

    proptest! {
        #[test]
        fn test_output_rows_are_distributions(
            rows in prop::collection::vec(prop::collection::vec(-100.0..100.0f64, 4), 1..40),
            seed in any::<u64>(),
        ) {
            let mut network = demo_network(seed);
            let n = rows.len();
            let out = network.forward(&Matrix::from_data(rows));
            prop_assert_eq!(out.shape(), (n, 3));
            for row in &out.data {
                prop_assert!(row.iter().all(|&p| p >= 0.0 && p <= 1.0));
                prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            }
        }
    }
}
