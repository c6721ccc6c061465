//! TensorFlow.js layers-model export and import.

pub mod topology;
pub mod tfjs;
pub mod loader;

pub use tfjs::{save_layers_model, ExportOptions, ModelArtifacts, DEFAULT_SHARD_SIZE_BYTES, MODEL_JSON};
pub use loader::{load_layers_model, LoadedModel};
