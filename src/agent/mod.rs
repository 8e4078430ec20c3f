//! # DQN Agent
//!
//! The agent is driven by the caller once per environment step
//! ([`DqnAgent::on_step`]), optionally once per step for training
//! ([`DqnAgent::on_train`]) and once per episode boundary
//! ([`DqnAgent::on_episode_end`]). Calls are synchronous and never overlap.
//!
//! ## Training step
//!
//! 1. Sample `batch_size` transitions from the replay memory.
//! 2. Predict Q-values for the batch's states with the online approximator.
//! 3. Predict bootstrap values for the next states with the lagging
//!    approximator, or the online one when target sync is disabled.
//! 4. Overwrite the taken action's entry with its Bellman target.
//! 5. Fit the online approximator on the result as a single batch.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgentBuilder;
//! use deepq::diagnostics::CsvSink;
//!
//! let agent = DqnAgentBuilder::new(4, 2)
//!     .hidden_layers(&[128, 128])
//!     .replay_capacity(50_000)
//!     .batch_size(64)
//!     .target_sync_interval(1000.0)
//!     .sink(CsvSink::create("errors.csv").unwrap())
//!     .build()
//!     .unwrap();
//! println!("{}", agent.parameter_summary());
//! ```

mod dqn;
pub use dqn::{bellman_targets, train_on_batch, DqnAgent, DqnAgentBuilder, TrainingReport};
