//! # Function Approximator Contract
//!
//! The agent never looks inside the Q-value function. Everything it needs is
//! expressed by [`FunctionApproximator`]: batched prediction, supervised
//! fitting, structural cloning, hard and soft parameter copies, and
//! persistence. [`NeuralNetwork`](crate::network::NeuralNetwork) is the
//! implementation shipped with the crate; any other model can be plugged in.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How much a `fit` call reports while it runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verbosity {
    #[default]
    Silent,
    /// One log line per fit call
    Summary,
    /// One log line per epoch
    PerEpoch,
}

/// A Q-value function over a batch of states.
///
/// `Clone` must produce an instance with identical structure and
/// independently owned parameters.
pub trait FunctionApproximator: Clone {
    /// Map `[batch, state_size]` to `[batch, action_count]`.
    fn predict(&self, states: ArrayView2<f64>) -> Result<Array2<f64>>;

    /// Fit on `(states, targets)` as a single batch for `epochs` passes.
    fn fit(
        &mut self,
        states: ArrayView2<f64>,
        targets: ArrayView2<f64>,
        epochs: usize,
        verbosity: Verbosity,
    ) -> Result<()>;

    /// Overwrite `other`'s parameters with this instance's.
    fn copy_parameters_to(&self, other: &mut Self);

    /// Move `other`'s parameters a `blend` fraction toward this instance's:
    /// `other = other * (1 - blend) + self * blend`.
    fn soft_copy_parameters_to(&self, other: &mut Self, blend: f64);

    fn save_state(&self, path: &Path) -> Result<()>;

    fn load_state(&mut self, path: &Path) -> Result<()>;

    /// Human readable description of the parameters.
    fn parameter_summary(&self) -> String;
}

/// Index of the largest value in each row. Ties go to the lowest index;
/// NaN never wins against a number.
pub fn argmax_rows(q_values: ArrayView2<f64>) -> Array1<usize> {
    q_values
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(best_idx, best), (idx, &val)| {
                    if val > best {
                        (idx, val)
                    } else {
                        (best_idx, best)
                    }
                })
                .0
        })
        .collect()
}

/// Largest value in each row. A NaN anywhere in a row makes that row's
/// maximum NaN.
pub fn max_rows(q_values: ArrayView2<f64>) -> Array1<f64> {
    q_values
        .rows()
        .into_iter()
        .map(|row| {
            row.iter().fold(f64::NEG_INFINITY, |max, &val| {
                if max.is_nan() || val.is_nan() {
                    f64::NAN
                } else {
                    max.max(val)
                }
            })
        })
        .collect()
}
