use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use bincode::{deserialize, serialize};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::activations::Activation;
use crate::approximator::{FunctionApproximator, Verbosity};
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, ForwardCache};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward network of dense layers, an optimizer, and a learning rate.
///
/// This is the Q-value approximator the agent builds when it is not handed
/// one: ReLU hidden layers, a linear output layer with one unit per action,
/// fitted on mean squared error.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
    pub learning_rate: f64,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes, activations, and optimizer.
    /// Weights are initialized from OS entropy.
    pub fn new(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        learning_rate: f64,
    ) -> Result<Self> {
        Self::new_using(layer_sizes, activations, optimizer, learning_rate, &mut rand::thread_rng())
    }

    /// Same as [`NeuralNetwork::new`] with reproducible weight initialization.
    pub fn with_seed(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        learning_rate: f64,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_using(layer_sizes, activations, optimizer, learning_rate, &mut rng)
    }

    pub fn new_using<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_config(
                "layer_sizes",
                "Network must have at least input and output layers",
            ));
        }
        if layer_sizes.contains(&0) {
            return Err(DqnError::invalid_config("layer_sizes", "Layer sizes must be non-zero"));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(DqnError::invalid_config(
                "activations",
                format!(
                    "expected {} activations for {} layer sizes, got {}",
                    layer_sizes.len() - 1,
                    layer_sizes.len(),
                    activations.len()
                ),
            ));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(DqnError::invalid_config(
                "learning_rate",
                format!("must be positive and finite, got {}", learning_rate),
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, rng))
            .collect();

        Ok(NeuralNetwork {
            layers,
            optimizer,
            learning_rate,
        })
    }

    /// Q-network layout: `state_size -> hidden... -> action_count`, ReLU on hidden
    /// layers and a linear output.
    pub fn q_network<R: Rng + ?Sized>(
        state_size: usize,
        hidden_layers: &[usize],
        action_count: usize,
        optimizer: OptimizerWrapper,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(hidden_layers.len() + 2);
        layer_sizes.push(state_size);
        layer_sizes.extend_from_slice(hidden_layers);
        layer_sizes.push(action_count);

        let mut activations = vec![Activation::Relu; hidden_layers.len()];
        activations.push(Activation::Linear);

        Self::new_using(&layer_sizes, &activations, optimizer, learning_rate, rng)
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(DenseLayer::parameter_count).sum()
    }

    /// Perform a forward pass for a batch of input vectors.
    pub fn forward_batch(&self, inputs: ArrayView2<f64>) -> Array2<f64> {
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.forward_batch(current.view());
        }
        current
    }

    /// One full-batch gradient step on `0.5 * mean((output - target)^2)`.
    /// Returns the mean squared error before the update.
    pub fn train_minibatch(&mut self, inputs: ArrayView2<f64>, targets: ArrayView2<f64>) -> f64 {
        let mut caches: Vec<ForwardCache> = Vec::with_capacity(self.layers.len());
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            let (output, cache) = layer.forward_train(current.view());
            caches.push(cache);
            current = output;
        }

        let output_errors = &current - &targets;
        let loss = output_errors.mapv(|e| e * e).mean().unwrap_or(0.0);
        let batch_size = inputs.nrows().max(1) as f64;
        let mut current_error = output_errors / batch_size;

        let mut gradients = Vec::with_capacity(self.layers.len());
        for (i, (layer, cache)) in self.layers.iter().zip(caches.iter()).enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) =
                layer.backward_batch(cache, current_error.view());
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
            gradients.push((weight_gradients, bias_gradients));
        }
        gradients.reverse();

        self.optimizer.begin_step();
        for (i, (layer, (weight_gradients, bias_gradients))) in
            self.layers.iter_mut().zip(gradients).enumerate()
        {
            self.optimizer.update_layer(
                i,
                &mut layer.weights,
                &weight_gradients,
                &mut layer.biases,
                &bias_gradients,
                self.learning_rate,
            );
        }

        loss
    }

    fn check_input(&self, states: ArrayView2<f64>) -> Result<()> {
        if states.ncols() != self.input_size() {
            return Err(DqnError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{}", states.ncols()),
            ));
        }
        Ok(())
    }
}

impl FunctionApproximator for NeuralNetwork {
    fn predict(&self, states: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_input(states)?;
        Ok(self.forward_batch(states))
    }

    fn fit(
        &mut self,
        states: ArrayView2<f64>,
        targets: ArrayView2<f64>,
        epochs: usize,
        verbosity: Verbosity,
    ) -> Result<()> {
        self.check_input(states)?;
        let expected = (states.nrows(), self.output_size());
        if targets.dim() != expected {
            return Err(DqnError::dimension_mismatch(
                format!("targets of shape {:?}", expected),
                format!("{:?}", targets.dim()),
            ));
        }

        let mut loss = 0.0;
        for epoch in 0..epochs {
            loss = self.train_minibatch(states, targets);
            if verbosity == Verbosity::PerEpoch {
                trace!(epoch, loss, "fit epoch");
            }
        }
        if verbosity != Verbosity::Silent {
            debug!(epochs, rows = states.nrows(), last_loss = loss, "fit finished");
        }
        Ok(())
    }

    fn copy_parameters_to(&self, other: &mut Self) {
        other.layers.clone_from(&self.layers);
    }

    fn soft_copy_parameters_to(&self, other: &mut Self, blend: f64) {
        for (target, source) in other.layers.iter_mut().zip(self.layers.iter()) {
            target
                .weights
                .zip_mut_with(&source.weights, |t, &s| *t = *t * (1.0 - blend) + s * blend);
            target
                .biases
                .zip_mut_with(&source.biases, |t, &s| *t = *t * (1.0 - blend) + s * blend);
        }
    }

    /// Serialize the whole network, optimizer state included, with bincode.
    fn save_state(&self, path: &Path) -> Result<()> {
        let serialized = serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    fn load_state(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path)?;
        *self = deserialize(&data)?;
        Ok(())
    }

    fn parameter_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "NeuralNetwork: {} layers, {} parameters, learning rate {}",
            self.layers.len(),
            self.parameter_count(),
            self.learning_rate
        );
        for (i, layer) in self.layers.iter().enumerate() {
            let weight_mean = layer.weights.mean().unwrap_or(0.0);
            let weight_std = layer.weights.std(0.0);
            let weight_min = layer.weights.iter().copied().fold(f64::INFINITY, f64::min);
            let weight_max = layer.weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let _ = writeln!(
                out,
                "  Layer {}: {} -> {} ({:?}) weights mean={:.4} std={:.4} min={:.4} max={:.4}",
                i + 1,
                layer.input_size(),
                layer.output_size(),
                layer.activation,
                weight_mean,
                weight_std,
                weight_min,
                weight_max
            );
        }
        let optimizer = match &self.optimizer {
            OptimizerWrapper::Sgd(_) => "SGD".to_string(),
            OptimizerWrapper::Adam(adam) => format!("Adam (t={})", adam.t),
        };
        let _ = write!(out, "  Optimizer: {}", optimizer);
        out
    }
}
