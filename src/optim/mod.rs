pub mod sgd;
pub mod adam;

use serde::{Serialize, Deserialize};

use crate::layers::dense::{Dense, LayerGradients};

pub use adam::{Adam, AdamConfig};
pub use sgd::Sgd;

/// Applies one update to every layer given that layer's batch gradients.
/// `grads[i]` belongs to `layers[i]`.
pub trait Optimizer {
    fn step(&mut self, layers: &mut [Dense], grads: &[LayerGradients]);
}

/// Optimizer selection in the Keras `{"class_name", "config"}` layout, as it
/// appears in a TF.js `training_config.optimizer_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name", content = "config")]
pub enum OptimizerConfig {
    Adam(AdamConfig),
    #[serde(rename = "SGD")]
    Sgd(Sgd),
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam(AdamConfig::default())
    }
}

impl OptimizerConfig {
    pub fn build(&self) -> Box<dyn Optimizer> {
        match self {
            OptimizerConfig::Adam(cfg) => Box::new(Adam::new(cfg.clone())),
            OptimizerConfig::Sgd(sgd) => Box::new(sgd.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keras_layout() {
        let json = serde_json::to_value(OptimizerConfig::default()).unwrap();
        assert_eq!(json["class_name"], "Adam");
        assert_eq!(json["config"]["learning_rate"], 0.001);
        assert_eq!(json["config"]["epsilon"], 1e-7);

        let sgd: OptimizerConfig =
            serde_json::from_str(r#"{"class_name":"SGD","config":{"learning_rate":0.5}}"#).unwrap();
        assert_eq!(sgd, OptimizerConfig::Sgd(Sgd::new(0.5)));
    }
}
