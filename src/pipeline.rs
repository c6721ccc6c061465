//! The demo end to end: build, compile, synthesize data, train, export.

use std::path::PathBuf;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::data::synthetic::Dataset;
use crate::error::Result;
use crate::export::tfjs::{save_layers_model, ExportOptions, ModelArtifacts};
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::train::epoch_stats::History;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::{TrainConfig, DEFAULT_BATCH_SIZE};

/// Everything the demo run needs.  `Default` is the fixed demo setup:
/// 4 → 32 relu → 3 softmax, adam + categorical cross-entropy, 100 random
/// samples, 5 epochs, exported to `./model`.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub spec: NetworkSpec,
    pub samples: usize,
    pub num_classes: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub output_dir: PathBuf,
    /// Fixed seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub export: ExportOptions,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            spec: NetworkSpec::demo(),
            samples: 100,
            num_classes: 3,
            epochs: 5,
            batch_size: DEFAULT_BATCH_SIZE,
            output_dir: PathBuf::from("model"),
            seed: None,
            export: ExportOptions::default(),
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub network: Network,
    pub history: History,
    pub artifacts: ModelArtifacts,
}

pub fn run(config: &DemoConfig) -> Result<RunSummary> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let spec = &config.spec;
    let mut network = spec.build(&mut rng);
    info!(
        input = spec.input_size,
        layers = network.layers.len(),
        parameters = network.parameter_count(),
        "model built"
    );

    let mut optimizer = spec.compile.optimizer.build();
    info!(
        optimizer = ?spec.compile.optimizer,
        loss = ?spec.compile.loss,
        metrics = ?spec.compile.metrics,
        "model compiled"
    );

    let dataset =
        Dataset::synthetic(config.samples, spec.input_size, config.num_classes, &mut rng)?;
    info!(
        samples = dataset.len(),
        features = spec.input_size,
        classes = config.num_classes,
        "synthetic data generated"
    );

    let train_config = TrainConfig::from_compile(&spec.compile, config.epochs)
        .with_batch_size(config.batch_size);
    let history = train_loop(
        &mut network,
        optimizer.as_mut(),
        &dataset.features,
        &dataset.labels,
        &train_config,
        &mut rng,
    )?;

    let artifacts = save_layers_model(
        &network,
        Some(&spec.compile),
        &config.output_dir,
        &config.export,
    )?;

    Ok(RunSummary { network, history, artifacts })
}
