//! Parameter update rules for the default network.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

pub trait Optimizer {
    /// Called once per fitted batch, before any layer is updated.
    fn begin_step(&mut self) {}

    /// Apply gradients to the parameters of layer `layer`.
    fn update_layer(
        &mut self,
        layer: usize,
        weights: &mut Array2<f64>,
        weight_gradients: &Array2<f64>,
        biases: &mut Array1<f64>,
        bias_gradients: &Array1<f64>,
        learning_rate: f64,
    );
}

/// Which optimizer a configured network is built with.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    Sgd(Sgd),
    Adam(Adam),
}

impl OptimizerWrapper {
    pub fn from_kind(kind: OptimizerKind) -> Self {
        match kind {
            OptimizerKind::Sgd => OptimizerWrapper::Sgd(Sgd::new()),
            OptimizerKind::Adam => OptimizerWrapper::Adam(Adam::default()),
        }
    }
}

impl Optimizer for OptimizerWrapper {
    fn begin_step(&mut self) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.begin_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.begin_step(),
        }
    }

    fn update_layer(
        &mut self,
        layer: usize,
        weights: &mut Array2<f64>,
        weight_gradients: &Array2<f64>,
        biases: &mut Array1<f64>,
        bias_gradients: &Array1<f64>,
        learning_rate: f64,
    ) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.update_layer(
                layer, weights, weight_gradients, biases, bias_gradients, learning_rate,
            ),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_layer(
                layer, weights, weight_gradients, biases, bias_gradients, learning_rate,
            ),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Sgd;

impl Sgd {
    pub fn new() -> Sgd {
        Sgd
    }
}

impl Optimizer for Sgd {
    fn update_layer(
        &mut self,
        _layer: usize,
        weights: &mut Array2<f64>,
        weight_gradients: &Array2<f64>,
        biases: &mut Array1<f64>,
        bias_gradients: &Array1<f64>,
        learning_rate: f64,
    ) {
        weights.scaled_add(-learning_rate, weight_gradients);
        biases.scaled_add(-learning_rate, bias_gradients);
    }
}

/// First and second moment estimates for one layer
#[derive(Serialize, Deserialize, Clone, Debug)]
struct Moments {
    m_weights: Array2<f64>,
    v_weights: Array2<f64>,
    m_biases: Array1<f64>,
    v_biases: Array1<f64>,
}

impl Moments {
    fn zeros(weights: &Array2<f64>, biases: &Array1<f64>) -> Self {
        Moments {
            m_weights: Array2::zeros(weights.dim()),
            v_weights: Array2::zeros(weights.dim()),
            m_biases: Array1::zeros(biases.dim()),
            v_biases: Array1::zeros(biases.dim()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// Number of batches fitted so far
    pub t: usize,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            t: 0,
            moments: Vec::new(),
        }
    }

    fn moments_for(&mut self, layer: usize, weights: &Array2<f64>, biases: &Array1<f64>) -> &mut Moments {
        while self.moments.len() <= layer {
            self.moments.push(Moments::zeros(weights, biases));
        }
        if self.moments[layer].m_weights.dim() != weights.dim() {
            self.moments[layer] = Moments::zeros(weights, biases);
        }
        &mut self.moments[layer]
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update_layer(
        &mut self,
        layer: usize,
        weights: &mut Array2<f64>,
        weight_gradients: &Array2<f64>,
        biases: &mut Array1<f64>,
        bias_gradients: &Array1<f64>,
        learning_rate: f64,
    ) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let t = self.t.max(1) as i32;
        let correction1 = 1.0 - beta1.powi(t);
        let correction2 = 1.0 - beta2.powi(t);
        let moments = self.moments_for(layer, weights, biases);

        moments.m_weights.zip_mut_with(weight_gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        moments.v_weights.zip_mut_with(weight_gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);
        moments.m_biases.zip_mut_with(bias_gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        moments.v_biases.zip_mut_with(bias_gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(weights)
            .and(&moments.m_weights)
            .and(&moments.v_weights)
            .for_each(|w, &m, &v| {
                *w -= learning_rate * (m / correction1) / ((v / correction2).sqrt() + epsilon);
            });
        ndarray::Zip::from(biases)
            .and(&moments.m_biases)
            .and(&moments.v_biases)
            .for_each(|b, &m, &v| {
                *b -= learning_rate * (m / correction1) / ((v / correction2).sqrt() + epsilon);
            });
    }
}
