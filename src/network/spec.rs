use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::loss::loss_type::LossType;
use crate::network::network::Network;
use crate::optim::OptimizerConfig;

/// Describes one dense layer in a network specification.
///
/// The input width is implied by the previous layer (or by
/// `NetworkSpec::input_size` for the first one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: ActivationFunction,
}

/// Metrics reported alongside the loss during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Categorical accuracy: argmax(predicted) == argmax(expected).
    Accuracy,
}

/// Optimizer, loss and metrics attached to a network before training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileSpec {
    pub optimizer: OptimizerConfig,
    pub loss: LossType,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Default for CompileSpec {
    /// adam / categorical_crossentropy / accuracy.
    fn default() -> Self {
        CompileSpec {
            optimizer: OptimizerConfig::default(),
            loss: LossType::CategoricalCrossentropy,
            metrics: vec![Metric::Accuracy],
        }
    }
}

/// A fully serializable description of a sequential architecture plus its
/// compile settings.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of any
/// trained weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Features per input sample.
    pub input_size: usize,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub compile: CompileSpec,
}

impl NetworkSpec {
    /// 4 → 32 (relu) → 3 (softmax), compiled with adam and categorical
    /// cross-entropy.
    pub fn demo() -> NetworkSpec {
        NetworkSpec {
            input_size: 4,
            layers: vec![
                LayerSpec { units: 32, activation: ActivationFunction::Relu },
                LayerSpec { units: 3, activation: ActivationFunction::Softmax },
            ],
            compile: CompileSpec::default(),
        }
    }

    /// Instantiates freshly initialized layers.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Network {
        let mut network = Network::new(self.input_size);
        for layer in &self.layers {
            network.add_dense(layer.units, layer.activation, rng);
        }
        network
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_demo_builds_expected_widths() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = NetworkSpec::demo().build(&mut rng);
        let widths: Vec<usize> = network.layers.iter().map(|l| l.units).collect();
        assert_eq!(widths, vec![32, 3]);
        assert_eq!(network.input_size(), 4);
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("ferrite_tfjs_spec_{}.json", std::process::id()));
        let path = path.to_str().unwrap().to_owned();
        let spec = NetworkSpec::demo();
        spec.save_json(&path).unwrap();
        let loaded = NetworkSpec::load_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, spec);
    }

    #[test]
    fn test_compile_defaults_when_missing() {
        let spec: NetworkSpec = serde_json::from_str(
            r#"{"input_size": 2, "layers": [{"units": 1, "activation": "sigmoid"}]}"#,
        ).unwrap();
        assert_eq!(spec.compile.loss, LossType::CategoricalCrossentropy);
        assert_eq!(spec.compile.metrics, vec![Metric::Accuracy]);
    }
}
