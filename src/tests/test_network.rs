use ndarray::{array, Array2};

use crate::activations::Activation;
use crate::approximator::{FunctionApproximator, Verbosity};
use crate::error::DqnError;
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper, Sgd};

fn mse(network: &NeuralNetwork, inputs: &Array2<f64>, targets: &Array2<f64>) -> f64 {
    let predicted = network.predict(inputs.view()).unwrap();
    (&predicted - targets).mapv(|e| e * e).mean().unwrap()
}

#[test]
fn test_network_creation() {
    let network = NeuralNetwork::with_seed(
        &[4, 16, 2],
        &[Activation::Relu, Activation::Linear],
        OptimizerWrapper::Sgd(Sgd::new()),
        0.01,
        7,
    )
    .unwrap();

    assert_eq!(network.layers.len(), 2);
    assert_eq!(network.input_size(), 4);
    assert_eq!(network.output_size(), 2);
    assert_eq!(network.parameter_count(), 4 * 16 + 16 + 16 * 2 + 2);
}

#[test]
fn test_network_rejects_bad_layouts() {
    let sgd = || OptimizerWrapper::Sgd(Sgd::new());
    assert!(NeuralNetwork::new(&[4], &[], sgd(), 0.01).is_err());
    assert!(NeuralNetwork::new(&[4, 0, 2], &[Activation::Relu, Activation::Linear], sgd(), 0.01).is_err());
    assert!(NeuralNetwork::new(&[4, 2], &[Activation::Relu, Activation::Linear], sgd(), 0.01).is_err());
    assert!(matches!(
        NeuralNetwork::new(&[4, 2], &[Activation::Linear], sgd(), 0.0),
        Err(DqnError::InvalidConfig { .. })
    ));
}

#[test]
fn test_q_network_layout() {
    let mut rng = rand::thread_rng();
    let network = NeuralNetwork::q_network(3, &[8, 8], 5, OptimizerWrapper::Adam(Adam::default()), 0.001, &mut rng)
        .unwrap();

    let activations: Vec<Activation> = network.layers.iter().map(|l| l.activation).collect();
    assert_eq!(activations, vec![Activation::Relu, Activation::Relu, Activation::Linear]);
    assert_eq!(network.predict(Array2::zeros((6, 3)).view()).unwrap().dim(), (6, 5));
}

#[test]
fn test_predict_checks_input_width() {
    let network = NeuralNetwork::with_seed(&[3, 2], &[Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.1, 1)
        .unwrap();
    assert!(matches!(
        network.predict(Array2::zeros((2, 4)).view()),
        Err(DqnError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_fit_checks_target_shape() {
    let mut network =
        NeuralNetwork::with_seed(&[3, 2], &[Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.1, 1).unwrap();
    let result = network.fit(Array2::zeros((4, 3)).view(), Array2::zeros((4, 3)).view(), 1, Verbosity::Silent);
    assert!(matches!(result, Err(DqnError::DimensionMismatch { .. })));
}

#[test]
fn test_fit_reduces_loss() {
    let mut network =
        NeuralNetwork::with_seed(&[2, 1], &[Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.1, 3).unwrap();

    let inputs = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.5, -0.5]];
    let targets = inputs.map_axis(ndarray::Axis(1), |row| row[0] + 2.0 * row[1] - 0.5).insert_axis(ndarray::Axis(1));

    let before = mse(&network, &inputs, &targets);
    network.fit(inputs.view(), targets.view(), 500, Verbosity::Silent).unwrap();
    let after = mse(&network, &inputs, &targets);

    assert!(after < before);
    assert!(after < 1e-3, "loss after fitting: {}", after);
}

#[test]
fn test_adam_fit_reduces_loss() {
    let mut network = NeuralNetwork::with_seed(
        &[2, 8, 2],
        &[Activation::Relu, Activation::Linear],
        OptimizerWrapper::Adam(Adam::default()),
        0.01,
        9,
    )
    .unwrap();
    let inputs = array![[0.1, 0.2], [0.4, -0.3], [-0.5, 0.9], [1.0, 0.0]];
    let targets = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5], [-1.0, 2.0]];

    let before = mse(&network, &inputs, &targets);
    network.fit(inputs.view(), targets.view(), 200, Verbosity::PerEpoch).unwrap();
    assert!(mse(&network, &inputs, &targets) < before);
}

#[test]
fn test_copy_parameters_exact() {
    let source =
        NeuralNetwork::with_seed(&[3, 4, 2], &[Activation::Relu, Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.1, 1)
            .unwrap();
    let mut target =
        NeuralNetwork::with_seed(&[3, 4, 2], &[Activation::Relu, Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.1, 2)
            .unwrap();
    assert_ne!(source.layers, target.layers);

    source.copy_parameters_to(&mut target);
    assert_eq!(source.layers, target.layers);

    let query = array![[0.3, -1.0, 2.0]];
    assert_eq!(source.predict(query.view()).unwrap(), target.predict(query.view()).unwrap());
}

#[test]
fn test_soft_copy_blends_parameters() {
    let mut source =
        NeuralNetwork::with_seed(&[2, 2], &[Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.1, 1).unwrap();
    let mut target = source.clone();
    source.layers[0].weights.fill(2.0);
    source.layers[0].biases.fill(-4.0);
    target.layers[0].weights.fill(0.0);
    target.layers[0].biases.fill(0.0);

    source.soft_copy_parameters_to(&mut target, 0.25);
    assert_eq!(target.layers[0].weights, Array2::from_elem((2, 2), 0.5));
    assert_eq!(target.layers[0].biases, array![-1.0, -1.0]);

    source.soft_copy_parameters_to(&mut target, 0.25);
    assert_eq!(target.layers[0].weights, Array2::from_elem((2, 2), 0.875));
}

#[test]
fn test_clone_is_independent() {
    let network =
        NeuralNetwork::with_seed(&[2, 2], &[Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.5, 4).unwrap();
    let mut copy = network.clone();
    copy.fit(array![[1.0, 1.0]].view(), array![[10.0, -10.0]].view(), 5, Verbosity::Summary)
        .unwrap();
    assert_ne!(network.layers, copy.layers);
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.bin");

    let network = NeuralNetwork::with_seed(
        &[3, 5, 2],
        &[Activation::Tanh, Activation::Linear],
        OptimizerWrapper::Adam(Adam::default()),
        0.01,
        21,
    )
    .unwrap();
    network.save_state(&path).unwrap();

    let mut restored =
        NeuralNetwork::with_seed(&[3, 5, 2], &[Activation::Tanh, Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.5, 0)
            .unwrap();
    restored.load_state(&path).unwrap();

    assert_eq!(restored.layers, network.layers);
    assert_eq!(restored.learning_rate, 0.01);
    assert!(matches!(restored.optimizer, OptimizerWrapper::Adam(_)));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut network =
        NeuralNetwork::with_seed(&[2, 2], &[Activation::Linear], OptimizerWrapper::Sgd(Sgd::new()), 0.1, 0).unwrap();
    assert!(matches!(
        network.load_state(&dir.path().join("missing.bin")),
        Err(DqnError::Io(_))
    ));
}

#[test]
fn test_parameter_summary_lists_layers() {
    let network = NeuralNetwork::with_seed(
        &[4, 6, 3],
        &[Activation::Relu, Activation::Linear],
        OptimizerWrapper::Adam(Adam::default()),
        0.001,
        5,
    )
    .unwrap();
    let summary = network.parameter_summary();

    assert!(summary.starts_with("NeuralNetwork: 2 layers, 51 parameters"));
    assert!(summary.contains("Layer 1: 4 -> 6 (Relu)"));
    assert!(summary.contains("Layer 2: 6 -> 3 (Linear)"));
    assert!(summary.contains("Optimizer: Adam (t=0)"));
}
