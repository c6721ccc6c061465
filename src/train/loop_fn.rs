use std::time::Instant;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::layers::dense::LayerGradients;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::spec::Metric;
use crate::optim::Optimizer;
use crate::train::epoch_stats::{EpochStats, History};
use crate::train::metrics::{categorical_accuracy, correct_count};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs of mini-batch gradient descent
/// and returns one `EpochStats` per epoch.
///
/// # Arguments
/// - `network`   — modified in place
/// - `optimizer` — applies each batch's gradients (carries its own state)
/// - `features`  — one sample per row, `network.input_size()` columns
/// - `labels`    — targets, one row per sample, `network.output_size()` columns
/// - `config`    — epochs, batch size, shuffling, loss and metrics
/// - `rng`       — drives the per-epoch shuffle
///
/// # Errors
/// `InvalidConfig` if `config.batch_size` is 0, `EmptyDataset` if there are
/// no samples, `ShapeMismatch` if features, labels and network disagree.
pub fn train_loop<R: Rng + ?Sized>(
    network: &mut Network,
    optimizer: &mut dyn Optimizer,
    features: &Matrix,
    labels: &Matrix,
    config: &TrainConfig,
    rng: &mut R,
) -> Result<History> {
    if config.batch_size == 0 {
        return Err(Error::InvalidConfig("batch_size must be at least 1".to_owned()));
    }
    check_shapes(network, features, labels)?;

    let mut history = History::default();

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let (loss, correct) = run_one_epoch(network, optimizer, features, labels, config, rng);

        let accuracy = if config.tracks(Metric::Accuracy) {
            Some(correct as f64 / features.rows as f64)
        } else {
            None
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            loss,
            accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        match stats.accuracy {
            Some(acc) => info!(
                epoch,
                total = config.epochs,
                loss,
                accuracy = acc,
                elapsed_ms = stats.elapsed_ms,
                "epoch finished"
            ),
            None => info!(
                epoch,
                total = config.epochs,
                loss,
                elapsed_ms = stats.elapsed_ms,
                "epoch finished"
            ),
        }

        history.epochs.push(stats);
    }

    Ok(history)
}

/// Mean loss and categorical accuracy over a dataset without updating weights.
pub fn evaluate(
    network: &mut Network,
    features: &Matrix,
    labels: &Matrix,
    loss_type: LossType,
) -> Result<(f64, f64)> {
    check_shapes(network, features, labels)?;
    let output = network.forward(features);
    Ok((loss_type.loss(&output, labels), categorical_accuracy(&output, labels)))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn check_shapes(network: &Network, features: &Matrix, labels: &Matrix) -> Result<()> {
    if features.rows == 0 {
        return Err(Error::EmptyDataset);
    }
    if features.cols != network.input_size() {
        return Err(Error::ShapeMismatch {
            expected: (features.rows, network.input_size()),
            actual: features.shape(),
        });
    }
    if labels.rows != features.rows || labels.cols != network.output_size() {
        return Err(Error::ShapeMismatch {
            expected: (features.rows, network.output_size()),
            actual: labels.shape(),
        });
    }
    Ok(())
}

/// Runs one full epoch.  Returns the sample-weighted mean batch loss and the
/// number of correctly classified samples (measured before each update).
fn run_one_epoch<R: Rng + ?Sized>(
    network: &mut Network,
    optimizer: &mut dyn Optimizer,
    features: &Matrix,
    labels: &Matrix,
    config: &TrainConfig,
    rng: &mut R,
) -> (f64, usize) {
    let n = features.rows;
    let mut total_loss = 0.0;
    let mut correct = 0usize;

    let mut indices: Vec<usize> = (0..n).collect();
    if config.shuffle {
        indices.shuffle(rng);
    }

    for (batch_no, batch) in indices.chunks(config.batch_size).enumerate() {
        let batch_x = features.select_rows(batch);
        let batch_y = labels.select_rows(batch);

        let output = network.forward(&batch_x);
        let batch_loss = config.loss_type.loss(&output, &batch_y);
        total_loss += batch_loss * batch.len() as f64;
        correct += correct_count(&output, &batch_y);

        let grads = backward_pass(network, &batch_x, &output, &batch_y, config.loss_type);
        optimizer.step(&mut network.layers, &grads);

        debug!(batch = batch_no, size = batch.len(), loss = batch_loss, "batch step");
    }

    (total_loss / n as f64, correct)
}

/// Backpropagates the batch loss through every layer.  `grads[i]` belongs to
/// `network.layers[i]`; the forward pass for `input` must already have run.
fn backward_pass(
    network: &Network,
    input: &Matrix,
    output: &Matrix,
    expected: &Matrix,
    loss_type: LossType,
) -> Vec<LayerGradients> {
    let n_layers = network.layers.len();
    let mut grads: Vec<LayerGradients> = Vec::with_capacity(n_layers);
    let mut upstream: Option<Matrix> = None;

    for i in (0..n_layers).rev() {
        let layer = &network.layers[i];
        let input_for_layer = if i == 0 { input } else { network.layers[i - 1].outputs() };

        let g = match upstream.take() {
            Some(grad_activations) => layer.backward(input_for_layer, &grad_activations),
            None => match loss_type.fused_logits_gradient(layer.activator, output, expected) {
                Some(delta) => layer.backward_from_logits(input_for_layer, &delta),
                None => layer.backward(input_for_layer, &loss_type.derivative(output, expected)),
            },
        };

        upstream = Some(g.input.clone());
        grads.push(g);
    }

    grads.reverse();
    grads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::data::synthetic::Dataset;
    use crate::network::spec::NetworkSpec;
    use crate::optim::{Adam, Sgd};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_demo_training_records_one_loss_per_epoch() {
        let mut rng = StdRng::seed_from_u64(42);
        let spec = NetworkSpec::demo();
        let mut network = spec.build(&mut rng);
        let data = Dataset::synthetic(100, 4, 3, &mut rng).unwrap();
        let mut optimizer = spec.compile.optimizer.build();
        let config = TrainConfig::from_compile(&spec.compile, 5);

        let history = train_loop(&mut network, optimizer.as_mut(), &data.features, &data.labels, &config, &mut rng).unwrap();

        assert_eq!(history.len(), 5);
        assert!(history.losses().iter().all(|l| l.is_finite() && *l > 0.0));
        assert_eq!(history.accuracies().len(), 5);
        assert!(history.accuracies().iter().all(|a| (0.0..=1.0).contains(a)));
        let epochs: Vec<usize> = history.epochs.iter().map(|e| e.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_learns_separable_problem() {
        // Class is whichever of the two features is larger.
        let mut rng = StdRng::seed_from_u64(5);
        let mut network = Network::new(2);
        network
            .add_dense(8, ActivationFunction::Relu, &mut rng)
            .add_dense(2, ActivationFunction::Softmax, &mut rng);
        let x = crate::data::synthetic::random_features(200, 2, &mut rng);
        let labels: Vec<usize> = x.data.iter().map(|r| if r[0] > r[1] { 0 } else { 1 }).collect();
        let y = crate::data::synthetic::to_categorical(&labels, 2).unwrap();

        let (before, _) = evaluate(&mut network, &x, &y, LossType::CategoricalCrossentropy).unwrap();
        let mut adam = Adam::new(crate::optim::AdamConfig { learning_rate: 0.05, ..Default::default() });
        let config = TrainConfig::new(60, 16, LossType::CategoricalCrossentropy);
        train_loop(&mut network, &mut adam, &x, &y, &config, &mut rng).unwrap();
        let (after, accuracy) = evaluate(&mut network, &x, &y, LossType::CategoricalCrossentropy).unwrap();

        assert!(after < before, "loss did not drop: {} -> {}", before, after);
        assert!(accuracy > 0.9, "accuracy {}", accuracy);
    }

    #[test]
    fn test_mse_regression_with_sgd() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut network = Network::new(1);
        network.add_dense(1, ActivationFunction::Linear, &mut rng);
        let x = Matrix::from_data((0..20).map(|i| vec![i as f64 / 20.0]).collect());
        let y = x.map(|v| 3.0 * v + 1.0);

        let mut sgd = Sgd::new(0.5);
        let config = TrainConfig::new(500, 20, LossType::MeanSquaredError).with_shuffle(false);
        let history = train_loop(&mut network, &mut sgd, &x, &y, &config, &mut rng).unwrap();

        assert!(history.last().unwrap().loss < 1e-4);
        assert!(history.last().unwrap().accuracy.is_none());
        assert!((network.layers[0].weights.data[0][0] - 3.0).abs() < 0.05);
        assert!((network.layers[0].biases.data[0][0] - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_rejects_empty_and_mismatched_data() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut network = NetworkSpec::demo().build(&mut rng);
        let mut sgd = Sgd::default();
        let config = TrainConfig::new(1, 32, LossType::CategoricalCrossentropy);

        let empty = train_loop(&mut network, &mut sgd, &Matrix::zeros(0, 4), &Matrix::zeros(0, 3), &config, &mut rng);
        assert!(matches!(empty, Err(Error::EmptyDataset)));

        let wrong = train_loop(&mut network, &mut sgd, &Matrix::zeros(10, 4), &Matrix::zeros(10, 2), &config, &mut rng);
        assert!(matches!(wrong, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_zero_batch_size_is_an_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut network = NetworkSpec::demo().build(&mut rng);
        let before = network.layers[0].weights.clone();
        let mut sgd = Sgd::default();
        let config = TrainConfig::new(1, 32, LossType::CategoricalCrossentropy).with_batch_size(0);

        let result = train_loop(&mut network, &mut sgd, &Matrix::zeros(10, 4), &Matrix::zeros(10, 3), &config, &mut rng);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        assert_eq!(network.layers[0].weights, before);
    }
}
