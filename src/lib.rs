//! # deepq - Deep Q-Network agent core
//!
//! deepq turns a stream of environment interactions into periodic, stabilized
//! updates of a Q-value function approximator. It provides:
//!
//! - **Replay memory**: a fixed-capacity ring buffer with uniform sampling
//! - **Target sync**: disabled, hard-periodic, soft (blended) or episode-end
//!   refresh of a lagging copy of the approximator
//! - **Batched Bellman updates**: per-transition targets assembled into one
//!   supervised batch, touching only the outputs of the actions taken
//! - **Error statistics**: per-episode mean TD error and a 100-episode moving
//!   average, reported to a pluggable diagnostics sink
//!
//! The approximator is anything implementing
//! [`FunctionApproximator`](approximator::FunctionApproximator); a small dense
//! network ([`NeuralNetwork`](network::NeuralNetwork)) ships as the default.
//! Exploration is up to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgent;
//! use deepq::config::DqnConfig;
//! use deepq::replay_memory::Transition;
//! use ndarray::array;
//!
//! let mut config = DqnConfig::new(4, 2, 0.001, 0.99, 10_000, 32);
//! config.target_sync_interval = 500.0;
//! let mut agent = DqnAgent::new(config).unwrap();
//!
//! let state = array![0.1, -0.2, 0.3, -0.1];
//! let action = agent.optimal_action(state.view()).unwrap();
//! let next_state = array![0.15, -0.25, 0.35, -0.05];
//! agent.on_step(0, 0, Transition::new(state, action, 1.0, next_state, false));
//! agent.on_train().unwrap();
//! agent.on_episode_end(0);
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions for the default network
//! - [`agent`] - The DQN agent and its builder
//! - [`approximator`] - The function approximator contract
//! - [`config`] - Serializable agent configuration
//! - [`diagnostics`] - Sinks for per-episode error series
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers
//! - [`network`] - Default Q-network
//! - [`optimizer`] - SGD and Adam
//! - [`replay_memory`] - Experience replay
//! - [`stats`] - Error statistics
//! - [`sync`] - Target-network sync policy

pub mod activations;
pub mod agent;
pub mod approximator;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layers;
pub mod network;
pub mod optimizer;
pub mod replay_memory;
pub mod stats;
pub mod sync;

pub use agent::{DqnAgent, DqnAgentBuilder};
pub use approximator::FunctionApproximator;
pub use config::DqnConfig;
pub use error::{DqnError, Result};
pub use replay_memory::{ReplayMemory, Transition};
pub use sync::TargetSync;

#[cfg(test)]
mod tests;
