use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::export::tfjs::MODEL_JSON;
use crate::export::topology::{
    LayerConfig, ModelConfig, ModelJson, TrainingConfig, FLOAT32, LAYERS_MODEL_FORMAT,
};
use crate::layers::dense::Dense;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::spec::CompileSpec;

/// A network read back from a TF.js layers-model directory.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub network: Network,
    /// Present when the file carries a training config this crate understands.
    pub compile: Option<CompileSpec>,
    pub model_json: ModelJson,
}

/// Reads `dir/model.json` and its weight shards back into a `Network`.
///
/// # Errors
/// `InvalidModel` for anything that cannot become a sequential dense network:
/// a wrong `format`, a missing or repeated input layer, non-float32 weights,
/// shard sizes that disagree with the manifest (or overflow), ambiguous weight
/// names, or kernels of the wrong shape.
pub fn load_layers_model(dir: impl AsRef<Path>) -> Result<LoadedModel> {
    let dir = dir.as_ref();
    let file = fs::File::open(dir.join(MODEL_JSON))?;
    let model_json: ModelJson = serde_json::from_reader(std::io::BufReader::new(file))?;

    if model_json.format != LAYERS_MODEL_FORMAT {
        return Err(invalid(format!("unsupported format '{}'", model_json.format)));
    }

    let mut weights = read_weights(dir, &model_json)?;

    let ModelConfig::Sequential(sequential) = &model_json.model_topology.model_config;
    let mut network: Option<Network> = None;

    for layer in &sequential.layers {
        match layer {
            LayerConfig::InputLayer(cfg) => {
                if network.is_some() {
                    return Err(invalid(format!(
                        "unexpected input layer '{}' after the first layer",
                        cfg.name
                    )));
                }
                network = Some(Network::new(feature_width(&cfg.batch_input_shape)?));
            }
            LayerConfig::Dense(cfg) => {
                if network.is_none() {
                    let shape = cfg.batch_input_shape.as_ref()
                        .ok_or_else(|| invalid(format!("layer '{}' has no input shape", cfg.name)))?;
                    network = Some(Network::new(feature_width(shape)?));
                }
                let net = network.as_mut()
                    .ok_or_else(|| invalid("dense layer before input shape".to_owned()))?;

                let kernel = take_weight(&mut weights, &cfg.name, "kernel", &[net.output_size(), cfg.units])?;
                let bias = if cfg.use_bias {
                    take_weight(&mut weights, &cfg.name, "bias", &[cfg.units])?
                } else {
                    vec![0.0; cfg.units]
                };

                let dense = Dense::from_parameters(
                    cfg.name.clone(),
                    Matrix::from_flat(net.output_size(), cfg.units, &kernel),
                    Matrix::from_flat(1, cfg.units, &bias),
                    cfg.activation,
                );
                net.push_layer(dense)?;
            }
        }
    }

    let network = network.ok_or_else(|| invalid("model has no layers".to_owned()))?;

    let compile = model_json.model_topology.training_config.clone()
        .and_then(|value| serde_json::from_value::<TrainingConfig>(value).ok())
        .map(CompileSpec::from);

    info!(dir = %dir.display(), layers = network.layers.len(), "loaded tfjs layers model");

    Ok(LoadedModel { network, compile, model_json })
}

/// Decoded weights keyed by manifest name, with their declared shapes.
type WeightMap = HashMap<String, (Vec<usize>, Vec<f64>)>;

fn read_weights(dir: &Path, model_json: &ModelJson) -> Result<WeightMap> {
    let mut map = WeightMap::new();

    for group in &model_json.weights_manifest {
        let mut buffer = Vec::new();
        for path in &group.paths {
            check_relative(path)?;
            let bytes = fs::read(dir.join(path))?;
            debug!(path = %path, bytes = bytes.len(), "read weight shard");
            buffer.extend_from_slice(&bytes);
        }

        let expected = group.weights.iter()
            .try_fold(0usize, |acc, w| acc.checked_add(w.byte_len()?))
            .ok_or_else(|| {
                invalid(format!("weight group {:?} declares an impossibly large size", group.paths))
            })?;
        if expected != buffer.len() {
            return Err(invalid(format!(
                "weight group {:?} holds {} bytes, manifest expects {}",
                group.paths, buffer.len(), expected
            )));
        }

        let mut offset = 0;
        for entry in &group.weights {
            if entry.dtype != FLOAT32 {
                return Err(invalid(format!("weight '{}' has unsupported dtype '{}'", entry.name, entry.dtype)));
            }
            let len = entry.byte_len()
                .ok_or_else(|| invalid(format!("weight '{}' has an impossibly large shape", entry.name)))?;
            let values = buffer[offset..offset + len]
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect();
            offset += len;
            map.insert(entry.name.clone(), (entry.shape.clone(), values));
        }
    }

    Ok(map)
}

/// Looks up `layer/kind`, falling back to the single name ending in
/// `/layer/kind`, and checks its shape.  Several suffix matches are an error.
fn take_weight(weights: &mut WeightMap, layer: &str, kind: &str, shape: &[usize]) -> Result<Vec<f64>> {
    let exact = format!("{}/{}", layer, kind);
    let suffix = format!("/{}", exact);
    let key = if weights.contains_key(&exact) {
        exact
    } else {
        let mut matches: Vec<&String> = weights.keys().filter(|k| k.ends_with(&suffix)).collect();
        matches.sort();
        match matches.as_slice() {
            [] => return Err(invalid(format!("missing weight '{}'", exact))),
            [only] => (*only).clone(),
            several => {
                return Err(invalid(format!("weight '{}' is ambiguous: {:?}", exact, several)));
            }
        }
    };

    let (declared, values) = weights.remove(&key).unwrap_or_default();
    if declared != shape {
        return Err(invalid(format!("weight '{}' has shape {:?}, expected {:?}", key, declared, shape)));
    }
    Ok(values)
}

fn feature_width(batch_input_shape: &[Option<usize>]) -> Result<usize> {
    match batch_input_shape {
        [_, Some(width)] => Ok(*width),
        other => Err(invalid(format!("unsupported input shape {:?}", other))),
    }
}

/// Shard paths must stay inside the model directory.
fn check_relative(path: &str) -> Result<()> {
    let ok = Path::new(path).components().all(|c| matches!(c, Component::Normal(_)));
    if ok && !path.is_empty() {
        Ok(())
    } else {
        Err(invalid(format!("weight path '{}' escapes the model directory", path)))
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidModel(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_relative() {
        assert!(check_relative("group1-shard1of1.bin").is_ok());
        assert!(check_relative("../secret.bin").is_err());
        assert!(check_relative("/etc/passwd").is_err());
        assert!(check_relative("").is_err());
    }

    #[test]
    fn test_feature_width() {
        assert_eq!(feature_width(&[None, Some(4)]).unwrap(), 4);
        assert!(feature_width(&[None, Some(4), Some(2)]).is_err());
        assert!(feature_width(&[None, None]).is_err());
    }

    fn weight_map(names: &[&str]) -> WeightMap {
        names.iter()
            .map(|name| (name.to_string(), (vec![1], vec![1.0])))
            .collect()
    }

    #[test]
    fn test_take_weight_prefers_exact_then_unique_suffix() {
        let mut weights = weight_map(&["dense/kernel", "outer/dense/kernel", "outer/dense/bias"]);
        assert!(take_weight(&mut weights, "dense", "kernel", &[1]).is_ok());
        assert!(weights.contains_key("outer/dense/kernel"));
        assert!(take_weight(&mut weights, "dense", "bias", &[1]).is_ok());
        assert!(!weights.contains_key("outer/dense/bias"));
        assert!(matches!(take_weight(&mut weights, "dense", "gamma", &[1]), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_take_weight_rejects_ambiguous_suffix() {
        let mut weights = weight_map(&["a/dense/kernel", "b/dense/kernel"]);
        match take_weight(&mut weights, "dense", "kernel", &[1]) {
            Err(Error::InvalidModel(reason)) => assert!(reason.contains("ambiguous"), "{}", reason),
            other => panic!("expected ambiguity error, got {:?}", other),
        }
        assert_eq!(weights.len(), 2);
    }
}
