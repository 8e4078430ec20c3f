//! # Activation Functions
//!
//! Element-wise non-linearities for the default network. Hidden layers use
//! ReLU by default and the output layer is linear, since Q-values are
//! unbounded regression targets.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// An enumeration of the activation functions a dense layer can apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    #[default]
    Relu,
    Linear,
    Sigmoid,
    Tanh,
    LeakyRelu { alpha: f64 },
}

impl Activation {
    /// Apply the activation function to a batch in-place.
    pub fn apply_batch(&self, inputs: &mut Array2<f64>) {
        match *self {
            Activation::Relu => inputs.mapv_inplace(|v| v.max(0.0)),
            Activation::Linear => {}
            Activation::Sigmoid => inputs.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Tanh => inputs.mapv_inplace(f64::tanh),
            Activation::LeakyRelu { alpha } => {
                inputs.mapv_inplace(|v| if v > 0.0 { v } else { alpha * v })
            }
        }
    }

    /// Derivative with respect to the pre-activation values.
    pub fn derivative_batch(&self, inputs: ArrayView2<f64>) -> Array2<f64> {
        match *self {
            Activation::Relu => inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(inputs.dim()),
            Activation::Sigmoid => inputs.mapv(|v| {
                let sigmoid = 1.0 / (1.0 + (-v).exp());
                sigmoid * (1.0 - sigmoid)
            }),
            Activation::Tanh => inputs.mapv(|v| {
                let tanh_v = v.tanh();
                1.0 - tanh_v * tanh_v
            }),
            Activation::LeakyRelu { alpha } => inputs.mapv(|v| if v > 0.0 { 1.0 } else { alpha }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_relu_and_derivative() {
        let mut x = array![[-1.0, 0.0, 2.0]];
        let deriv = Activation::Relu.derivative_batch(x.view());
        Activation::Relu.apply_batch(&mut x);
        assert_eq!(x, array![[0.0, 0.0, 2.0]]);
        assert_eq!(deriv, array![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_linear_is_identity() {
        let mut x = array![[-3.5, 4.25]];
        Activation::Linear.apply_batch(&mut x);
        assert_eq!(x, array![[-3.5, 4.25]]);
        assert_eq!(Activation::Linear.derivative_batch(x.view()), array![[1.0, 1.0]]);
    }

    #[test]
    fn test_sigmoid_bounds() {
        let mut x = array![[-50.0, 0.0, 50.0]];
        Activation::Sigmoid.apply_batch(&mut x);
        assert!(x.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!((x[[0, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_leaky_relu_slope() {
        let act = Activation::LeakyRelu { alpha: 0.1 };
        let mut x = array![[-2.0, 3.0]];
        let deriv = act.derivative_batch(x.view());
        act.apply_batch(&mut x);
        assert!((x[[0, 0]] + 0.2).abs() < 1e-12);
        assert_eq!(deriv, array![[0.1, 1.0]]);
    }
}
