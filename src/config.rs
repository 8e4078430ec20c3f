//! Agent configuration.
//!
//! [`DqnConfig`] is plain serde data so it can live in a JSON file next to the
//! saved network. Everything is validated once, when the agent is built.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::optimizer::OptimizerKind;
use crate::sync::TargetSync;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqnConfig {
    /// Length of the flat state vector
    pub state_size: usize,
    /// Number of discrete actions (output units)
    pub action_count: usize,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub replay_capacity: usize,
    pub batch_size: usize,
    /// Fit passes over each sampled batch
    #[serde(default = "default_training_epochs")]
    pub training_epochs: usize,
    /// Only every `memory_interval`-th global step is stored
    #[serde(default = "default_memory_interval")]
    pub memory_interval: usize,
    /// 0 disables the lagging network, (0, 1) is a soft-sync blend factor,
    /// >= 1 is a hard-sync period in global steps
    #[serde(default)]
    pub target_sync_interval: f64,
    /// Hard-sync the lagging network at every episode end instead
    #[serde(default)]
    pub sync_on_episode_end: bool,
    /// Hidden layer sizes of the default network
    #[serde(default = "default_hidden_layers")]
    pub hidden_layers: Vec<usize>,
    #[serde(default)]
    pub optimizer: OptimizerKind,
    /// Seeds network initialization and replay sampling when set
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_training_epochs() -> usize {
    1
}

fn default_memory_interval() -> usize {
    1
}

fn default_hidden_layers() -> Vec<usize> {
    vec![64, 64]
}

impl DqnConfig {
    pub fn new(
        state_size: usize,
        action_count: usize,
        learning_rate: f64,
        discount_factor: f64,
        replay_capacity: usize,
        batch_size: usize,
    ) -> Self {
        DqnConfig {
            state_size,
            action_count,
            learning_rate,
            discount_factor,
            replay_capacity,
            batch_size,
            training_epochs: default_training_epochs(),
            memory_interval: default_memory_interval(),
            target_sync_interval: 0.0,
            sync_on_episode_end: false,
            hidden_layers: default_hidden_layers(),
            optimizer: OptimizerKind::default(),
            seed: None,
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Reject configurations that could only fail later, during training.
    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 {
            return Err(DqnError::invalid_config("state_size", "must be greater than 0"));
        }
        if self.action_count == 0 {
            return Err(DqnError::invalid_config("action_count", "must be greater than 0"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(DqnError::invalid_config(
                "learning_rate",
                format!("must be positive and finite, got {}", self.learning_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(DqnError::invalid_config(
                "discount_factor",
                format!("must lie in [0, 1], got {}", self.discount_factor),
            ));
        }
        if self.replay_capacity == 0 {
            return Err(DqnError::invalid_config("replay_capacity", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(DqnError::invalid_config("batch_size", "must be greater than 0"));
        }
        if self.training_epochs == 0 {
            return Err(DqnError::invalid_config("training_epochs", "must be greater than 0"));
        }
        if self.memory_interval == 0 {
            return Err(DqnError::invalid_config("memory_interval", "must be greater than 0"));
        }
        if self.hidden_layers.contains(&0) {
            return Err(DqnError::invalid_config("hidden_layers", "layer sizes must be non-zero"));
        }
        self.target_sync().map(|_| ())
    }

    /// Resolve the raw sync settings into a policy.
    pub fn target_sync(&self) -> Result<TargetSync> {
        TargetSync::resolve(self.target_sync_interval, self.sync_on_episode_end)
    }
}
