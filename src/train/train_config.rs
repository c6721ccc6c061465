use crate::loss::loss_type::LossType;
use crate::network::spec::{CompileSpec, Metric};

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`     — total number of full passes over the training data
/// - `batch_size` — samples per mini-batch; the last batch may be smaller
/// - `shuffle`    — reshuffle sample order at the start of every epoch
/// - `loss_type`  — which loss function to minimize
/// - `metrics`    — extra metrics reported in `EpochStats`
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub loss_type: LossType,
    pub metrics: Vec<Metric>,
}

impl TrainConfig {
    /// Shuffled mini-batches, no extra metrics.
    pub fn new(epochs: usize, batch_size: usize, loss_type: LossType) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            shuffle: true,
            loss_type,
            metrics: Vec::new(),
        }
    }

    /// Takes loss and metrics from the compile settings; batch size 32.
    pub fn from_compile(compile: &CompileSpec, epochs: usize) -> Self {
        TrainConfig {
            metrics: compile.metrics.clone(),
            ..TrainConfig::new(epochs, DEFAULT_BATCH_SIZE, compile.loss)
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub(crate) fn tracks(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }
}

pub const DEFAULT_BATCH_SIZE: usize = 32;
