use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activations::Activation;

/// A fully connected (dense) layer in a neural network
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
    pub activation: Activation,
}

/// Values cached by a training forward pass, consumed by the backward pass.
pub struct ForwardCache {
    pub inputs: Array2<f64>,
    pub pre_activation: Array2<f64>,
}

impl DenseLayer {
    /// Create a new dense layer with the given input size, output size, and activation function.
    /// Weights are drawn uniformly from `±sqrt(6 / fan)` where `fan` is the fan-in for
    /// ReLU-like activations and `fan_in + fan_out` otherwise. Biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let fan = match activation {
            Activation::Relu | Activation::LeakyRelu { .. } => input_size,
            _ => input_size + output_size,
        };
        let limit = (6.0 / fan.max(1) as f64).sqrt();
        let weights = Array2::random_using((input_size, output_size), Uniform::new(-limit, limit), rng);
        let biases = Array1::zeros(output_size);
        DenseLayer {
            weights,
            biases,
            activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    /// Number of trainable parameters
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Forward pass over a batch without keeping anything for backprop.
    pub fn forward_batch(&self, inputs: ArrayView2<f64>) -> Array2<f64> {
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Forward pass that also returns what the backward pass needs.
    pub fn forward_train(&self, inputs: ArrayView2<f64>) -> (Array2<f64>, ForwardCache) {
        let pre_activation = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        let cache = ForwardCache {
            inputs: inputs.to_owned(),
            pre_activation,
        };
        (outputs, cache)
    }

    /// Compute gradients for the layer's weights and biases for a batch.
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)`; the adjusted
    /// error is what the previous layer back-propagates through these weights.
    pub fn backward_batch(
        &self,
        cache: &ForwardCache,
        output_errors: ArrayView2<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
        let activation_deriv = self.activation.derivative_batch(cache.pre_activation.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let weight_gradients = cache.inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        (adjusted_error, weight_gradients, bias_gradients)
    }
}
