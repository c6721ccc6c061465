use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::export::topology::{
    DenseConfig, InputLayerConfig, Initializer, LayerConfig, ModelConfig, ModelJson, ModelTopology,
    SequentialConfig, TrainingConfig, WeightEntry, WeightGroup, BACKEND, FLOAT32, KERAS_VERSION,
    LAYERS_MODEL_FORMAT,
};
use crate::network::network::Network;
use crate::network::spec::CompileSpec;

pub const MODEL_JSON: &str = "model.json";

/// Shard size the TF.js converter uses by default.
pub const DEFAULT_SHARD_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Knobs for `save_layers_model`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Upper bound on the size of each `group1-shard*` file.
    pub shard_size_bytes: usize,
    /// Written to `generatedBy` / `convertedBy`.
    pub generated_by: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            shard_size_bytes: DEFAULT_SHARD_SIZE_BYTES,
            generated_by: format!("ferrite-tfjs v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Files written by one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifacts {
    pub dir: PathBuf,
    pub model_json: PathBuf,
    pub shards: Vec<PathBuf>,
    pub weight_bytes: usize,
}

/// Writes `network` as a TensorFlow.js layers model into `dir`:
/// `model.json` plus `group1-shard{i}of{n}.bin` weight files.
///
/// `dir` is created if it does not exist; existing files with the same
/// names are overwritten.
pub fn save_layers_model(
    network: &Network,
    compile: Option<&CompileSpec>,
    dir: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<ModelArtifacts> {
    if options.shard_size_bytes == 0 {
        return Err(Error::InvalidConfig("shard size must be positive".to_owned()));
    }
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let (entries, buffer) = weight_data(network);
    let shard_names = shard_names(buffer.len(), options.shard_size_bytes);

    let mut shards = Vec::with_capacity(shard_names.len());
    let mut chunks = buffer.chunks(options.shard_size_bytes);
    for name in &shard_names {
        let path = dir.join(name);
        let bytes = chunks.next().unwrap_or(&[]);
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote weight shard");
        shards.push(path);
    }

    let model_json = to_model_json(network, compile, entries, shard_names, &options.generated_by)?;
    let model_json_path = dir.join(MODEL_JSON);
    let writer = std::io::BufWriter::new(fs::File::create(&model_json_path)?);
    serde_json::to_writer(writer, &model_json)?;

    info!(
        dir = %dir.display(),
        layers = network.layers.len(),
        shards = shards.len(),
        weight_bytes = buffer.len(),
        "exported tfjs layers model"
    );

    Ok(ModelArtifacts {
        dir: dir.to_path_buf(),
        model_json: model_json_path,
        shards,
        weight_bytes: buffer.len(),
    })
}

/// Builds the `model.json` document for `network` with a single weight group.
pub fn to_model_json(
    network: &Network,
    compile: Option<&CompileSpec>,
    weights: Vec<WeightEntry>,
    shard_paths: Vec<String>,
    generated_by: &str,
) -> Result<ModelJson> {
    let first = network.layers.first().map(|l| l.name.as_str()).unwrap_or("dense");
    let mut layers = vec![LayerConfig::InputLayer(InputLayerConfig {
        batch_input_shape: vec![None, Some(network.input_size())],
        dtype: FLOAT32.to_owned(),
        sparse: false,
        ragged: false,
        name: format!("{}_input", first),
    })];

    layers.extend(network.layers.iter().enumerate().map(|(i, layer)| {
        LayerConfig::Dense(DenseConfig {
            name: layer.name.clone(),
            trainable: true,
            batch_input_shape: (i == 0).then(|| vec![None, Some(layer.input_size)]),
            dtype: FLOAT32.to_owned(),
            units: layer.units,
            activation: layer.activator,
            use_bias: true,
            kernel_initializer: Initializer::glorot_uniform(),
            bias_initializer: Initializer::zeros(),
            kernel_regularizer: None,
            bias_regularizer: None,
            activity_regularizer: None,
            kernel_constraint: None,
            bias_constraint: None,
        })
    }));

    let training_config = match compile {
        Some(compile) => Some(serde_json::to_value(TrainingConfig::from(compile))?),
        None => None,
    };

    Ok(ModelJson {
        format: LAYERS_MODEL_FORMAT.to_owned(),
        generated_by: generated_by.to_owned(),
        converted_by: Some(generated_by.to_owned()),
        model_topology: ModelTopology {
            keras_version: KERAS_VERSION.to_owned(),
            backend: BACKEND.to_owned(),
            model_config: ModelConfig::Sequential(SequentialConfig {
                name: "sequential".to_owned(),
                layers,
            }),
            training_config,
        },
        weights_manifest: vec![WeightGroup { paths: shard_paths, weights }],
    })
}

/// Manifest entries in write order (kernel then bias, layer by layer) and the
/// matching little-endian float32 bytes.  Kernels are row-major (input, units).
fn weight_data(network: &Network) -> (Vec<WeightEntry>, Vec<u8>) {
    let mut entries = Vec::with_capacity(network.layers.len() * 2);
    let mut buffer = Vec::with_capacity(network.parameter_count() * 4);

    for layer in &network.layers {
        entries.push(WeightEntry {
            name: format!("{}/kernel", layer.name),
            shape: vec![layer.input_size, layer.units],
            dtype: FLOAT32.to_owned(),
        });
        entries.push(WeightEntry {
            name: format!("{}/bias", layer.name),
            shape: vec![layer.units],
            dtype: FLOAT32.to_owned(),
        });
        for value in layer.weights.to_flat().into_iter().chain(layer.biases.to_flat()) {
            buffer.extend_from_slice(&(value as f32).to_le_bytes());
        }
    }

    (entries, buffer)
}

/// `group1-shard1ofN.bin` ... `group1-shardNofN.bin`; always at least one.
fn shard_names(total_bytes: usize, shard_size: usize) -> Vec<String> {
    let count = total_bytes.div_ceil(shard_size).max(1);
    (1..=count)
        .map(|i| format!("group1-shard{}of{}.bin", i, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_names() {
        assert_eq!(shard_names(1036, DEFAULT_SHARD_SIZE_BYTES), vec!["group1-shard1of1.bin"]);
        assert_eq!(
            shard_names(1036, 400),
            vec!["group1-shard1of3.bin", "group1-shard2of3.bin", "group1-shard3of3.bin"]
        );
        assert_eq!(shard_names(0, 400).len(), 1);
    }
}
