pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod train;
pub mod export;
pub mod pipeline;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::{Dense, LayerGradients};
pub use network::{Network, NetworkSpec, LayerSpec, CompileSpec, Metric};
pub use loss::{LossType, CrossEntropyLoss, MseLoss};
pub use optim::{Optimizer, OptimizerConfig, Adam, AdamConfig, Sgd};
pub use data::{Dataset, to_categorical};
pub use train::{train_loop, evaluate, TrainConfig, EpochStats, History};
pub use export::{save_layers_model, load_layers_model, ExportOptions, ModelArtifacts, LoadedModel};
pub use pipeline::{run, DemoConfig, RunSummary};
