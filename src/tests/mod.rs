pub mod test_network;
pub mod test_stats;

use std::fs;
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::approximator::{FunctionApproximator, Verbosity};
use crate::error::{DqnError, Result};

/// Arguments of one `fit` call.
#[derive(Clone, Debug, PartialEq)]
pub struct FitCall {
    pub states: Array2<f64>,
    pub targets: Array2<f64>,
    pub epochs: usize,
    pub verbosity: Verbosity,
}

/// Linear Q-function `q = states . weights` that records every fit call
/// instead of learning, so the agent's inputs to `fit` can be inspected.
#[derive(Clone, Debug)]
pub struct LinearQ {
    pub weights: Array2<f64>,
    pub fit_calls: Vec<FitCall>,
    pub fail_fit: bool,
}

impl LinearQ {
    pub fn new(weights: Array2<f64>) -> Self {
        LinearQ {
            weights,
            fit_calls: Vec::new(),
            fail_fit: false,
        }
    }
}

impl FunctionApproximator for LinearQ {
    fn predict(&self, states: ArrayView2<f64>) -> Result<Array2<f64>> {
        if states.ncols() != self.weights.nrows() {
            return Err(DqnError::dimension_mismatch(
                self.weights.nrows().to_string(),
                states.ncols().to_string(),
            ));
        }
        Ok(states.dot(&self.weights))
    }

    fn fit(
        &mut self,
        states: ArrayView2<f64>,
        targets: ArrayView2<f64>,
        epochs: usize,
        verbosity: Verbosity,
    ) -> Result<()> {
        if self.fail_fit {
            return Err(DqnError::Numerical("fit failed".to_string()));
        }
        self.fit_calls.push(FitCall {
            states: states.to_owned(),
            targets: targets.to_owned(),
            epochs,
            verbosity,
        });
        Ok(())
    }

    fn copy_parameters_to(&self, other: &mut Self) {
        other.weights.assign(&self.weights);
    }

    fn soft_copy_parameters_to(&self, other: &mut Self, blend: f64) {
        other
            .weights
            .zip_mut_with(&self.weights, |t, &s| *t = *t * (1.0 - blend) + s * blend);
    }

    fn save_state(&self, path: &Path) -> Result<()> {
        fs::write(path, bincode::serialize(&self.weights)?)?;
        Ok(())
    }

    fn load_state(&mut self, path: &Path) -> Result<()> {
        self.weights = bincode::deserialize(&fs::read(path)?)?;
        Ok(())
    }

    fn parameter_summary(&self) -> String {
        format!("LinearQ {:?}", self.weights.dim())
    }
}
