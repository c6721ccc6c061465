//! Serde model of a TensorFlow.js "layers-model" `model.json`.
//!
//! Only the pieces needed to describe a sequential stack of dense layers are
//! typed; free-form Keras objects (initializer configs, regularizers,
//! training config of foreign files) are kept as `serde_json::Value`.

use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::activation::activation::ActivationFunction;
use crate::loss::loss_type::LossType;
use crate::network::spec::{CompileSpec, Metric};
use crate::optim::OptimizerConfig;

pub const LAYERS_MODEL_FORMAT: &str = "layers-model";
pub const KERAS_VERSION: &str = "2.13.1";
pub const BACKEND: &str = "tensorflow";
pub const FLOAT32: &str = "float32";

/// Top-level `model.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelJson {
    pub format: String,
    #[serde(rename = "generatedBy")]
    pub generated_by: String,
    #[serde(rename = "convertedBy", default)]
    pub converted_by: Option<String>,
    #[serde(rename = "modelTopology")]
    pub model_topology: ModelTopology,
    #[serde(rename = "weightsManifest")]
    pub weights_manifest: Vec<WeightGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTopology {
    pub keras_version: String,
    pub backend: String,
    pub model_config: ModelConfig,
    /// Kept untyped so that files written by other tools (whose metric and
    /// optimizer entries we do not model) still load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_config: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name", content = "config")]
pub enum ModelConfig {
    Sequential(SequentialConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialConfig {
    pub name: String,
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name", content = "config")]
pub enum LayerConfig {
    InputLayer(InputLayerConfig),
    Dense(DenseConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputLayerConfig {
    /// `[null, features]`; the leading `null` is the batch dimension.
    pub batch_input_shape: Vec<Option<usize>>,
    pub dtype: String,
    #[serde(default)]
    pub sparse: bool,
    #[serde(default)]
    pub ragged: bool,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub trainable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_input_shape: Option<Vec<Option<usize>>>,
    pub dtype: String,
    pub units: usize,
    pub activation: ActivationFunction,
    #[serde(default = "default_true")]
    pub use_bias: bool,
    pub kernel_initializer: Initializer,
    pub bias_initializer: Initializer,
    #[serde(default)]
    pub kernel_regularizer: Option<Value>,
    #[serde(default)]
    pub bias_regularizer: Option<Value>,
    #[serde(default)]
    pub activity_regularizer: Option<Value>,
    #[serde(default)]
    pub kernel_constraint: Option<Value>,
    #[serde(default)]
    pub bias_constraint: Option<Value>,
}

fn default_true() -> bool {
    true
}

/// Keras initializer reference, e.g. `{"class_name": "GlorotUniform", "config": {"seed": null}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initializer {
    pub class_name: String,
    #[serde(default)]
    pub config: Value,
}

impl Initializer {
    pub fn glorot_uniform() -> Initializer {
        Initializer {
            class_name: "GlorotUniform".to_owned(),
            config: serde_json::json!({ "seed": null }),
        }
    }

    pub fn zeros() -> Initializer {
        Initializer {
            class_name: "Zeros".to_owned(),
            config: serde_json::json!({}),
        }
    }
}

/// `modelTopology.training_config` as this crate writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub loss: LossType,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub weighted_metrics: Option<Value>,
    #[serde(default)]
    pub loss_weights: Option<Value>,
    pub optimizer_config: OptimizerConfig,
}

impl From<&CompileSpec> for TrainingConfig {
    fn from(compile: &CompileSpec) -> Self {
        TrainingConfig {
            loss: compile.loss,
            metrics: compile.metrics.clone(),
            weighted_metrics: None,
            loss_weights: None,
            optimizer_config: compile.optimizer.clone(),
        }
    }
}

impl From<TrainingConfig> for CompileSpec {
    fn from(cfg: TrainingConfig) -> Self {
        CompileSpec {
            optimizer: cfg.optimizer_config,
            loss: cfg.loss,
            metrics: cfg.metrics,
        }
    }
}

/// One entry of `weightsManifest`: a set of shard files whose concatenated
/// bytes hold `weights` back to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGroup {
    pub paths: Vec<String>,
    pub weights: Vec<WeightEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: String,
}

impl WeightEntry {
    /// Number of elements, or `None` if the shape overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Size in bytes of the float32 payload, or `None` on overflow.
    pub fn byte_len(&self) -> Option<usize> {
        self.element_count()?.checked_mul(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_config_uses_keras_tagging() {
        let layer = LayerConfig::InputLayer(InputLayerConfig {
            batch_input_shape: vec![None, Some(4)],
            dtype: FLOAT32.to_owned(),
            sparse: false,
            ragged: false,
            name: "dense_input".to_owned(),
        });
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["class_name"], "InputLayer");
        assert_eq!(json["config"]["batch_input_shape"], serde_json::json!([null, 4]));
    }

    #[test]
    fn test_dense_config_parses_converter_output() {
        let raw = r#"{"class_name": "Dense", "config": {"name": "dense", "trainable": true,
            "batch_input_shape": [null, 4], "dtype": "float32", "units": 32, "activation": "relu",
            "use_bias": true, "kernel_initializer": {"class_name": "GlorotUniform", "config": {"seed": null}},
            "bias_initializer": {"class_name": "Zeros", "config": {}}, "kernel_regularizer": null,
            "bias_regularizer": null, "activity_regularizer": null, "kernel_constraint": null,
            "bias_constraint": null}}"#;
        match serde_json::from_str::<LayerConfig>(raw).unwrap() {
            LayerConfig::Dense(cfg) => {
                assert_eq!(cfg.units, 32);
                assert_eq!(cfg.activation, ActivationFunction::Relu);
                assert_eq!(cfg.batch_input_shape, Some(vec![None, Some(4)]));
            }
            other => panic!("unexpected layer {:?}", other),
        }
    }

    #[test]
    fn test_weight_entry_sizes_detect_overflow() {
        let entry = |shape: Vec<usize>| WeightEntry {
            name: "dense/kernel".to_owned(),
            shape,
            dtype: FLOAT32.to_owned(),
        };
        assert_eq!(entry(vec![4, 32]).element_count(), Some(128));
        assert_eq!(entry(vec![4, 32]).byte_len(), Some(512));
        assert_eq!(entry(vec![]).element_count(), Some(1));
        assert_eq!(entry(vec![usize::MAX, 2]).element_count(), None);
        assert_eq!(entry(vec![usize::MAX / 2]).byte_len(), None);
    }
}
