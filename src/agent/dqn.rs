use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::approximator::{argmax_rows, max_rows, FunctionApproximator, Verbosity};
use crate::config::DqnConfig;
use crate::diagnostics::{DiagnosticsSink, Series, TracingSink};
use crate::error::{DqnError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerKind, OptimizerWrapper};
use crate::replay_memory::{ReplayMemory, Transition};
use crate::stats::{EpisodeStats, RunningErrorStats};
use crate::sync::{SyncAction, TargetSync};

/// Outcome of one `on_train` call that actually trained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    /// Mean absolute TD error of the sampled batch
    pub avg_batch_error: f64,
    /// Trainings done in the current episode, this one included
    pub trainings_done: usize,
    /// Running mean of batch errors for the current episode
    pub episode_error_avg: f64,
}

/// Deep Q-Network agent.
///
/// The agent records transitions into a replay memory, keeps an optional
/// lagging copy of the approximator in sync according to a [`TargetSync`]
/// policy, and fits the online approximator on Bellman targets built from
/// sampled batches. Exploration is left to the caller; the agent only
/// answers with the greedy action.
///
/// # Example
///
/// ```rust
/// use deepq::agent::DqnAgent;
/// use deepq::config::DqnConfig;
/// use deepq::replay_memory::Transition;
/// use ndarray::array;
///
/// let mut config = DqnConfig::new(2, 2, 0.001, 0.99, 1000, 4);
/// config.hidden_layers = vec![8];
/// config.seed = Some(1);
/// let mut agent = DqnAgent::new(config).unwrap();
///
/// for global_step in 0..8 {
///     let state = array![global_step as f64, 1.0];
///     let action = agent.optimal_action(state.view()).unwrap();
///     let next_state = array![global_step as f64 + 1.0, 1.0];
///     agent.on_step(global_step, global_step, Transition::new(state, action, 1.0, next_state, false));
///     agent.on_train().unwrap();
/// }
/// agent.on_episode_end(0);
/// assert_eq!(agent.trainings_done(), 0);
/// ```
pub struct DqnAgent<A: FunctionApproximator = NeuralNetwork> {
    online: A,
    lagging: Option<A>,
    memory: ReplayMemory,
    sync: TargetSync,
    discount_factor: f64,
    batch_size: usize,
    training_epochs: usize,
    memory_interval: usize,
    verbosity: Verbosity,
    episode: EpisodeStats,
    error_stats: RunningErrorStats,
    sink: Box<dyn DiagnosticsSink + Send>,
}

impl DqnAgent<NeuralNetwork> {
    /// Create an agent around the default network described by `config`.
    pub fn new(config: DqnConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let network = NeuralNetwork::q_network(
            config.state_size,
            &config.hidden_layers,
            config.action_count,
            OptimizerWrapper::from_kind(config.optimizer),
            config.learning_rate,
            &mut rng,
        )?;
        let memory = ReplayMemory::with_rng(config.replay_capacity, StdRng::seed_from_u64(rng.gen()))?;

        Self::from_parts(&config, network, memory)
    }
}

impl<A: FunctionApproximator> DqnAgent<A> {
    /// Create an agent around a caller-supplied approximator. Network-specific
    /// settings in `config` (hidden layers, optimizer, learning rate) are only
    /// validated, not used. The approximator must map `state_size` inputs to
    /// `action_count` outputs.
    pub fn with_approximator(config: DqnConfig, approximator: A) -> Result<Self> {
        config.validate()?;
        let memory = match config.seed {
            Some(seed) => ReplayMemory::with_seed(config.replay_capacity, seed)?,
            None => ReplayMemory::new(config.replay_capacity)?,
        };
        Self::from_parts(&config, approximator, memory)
    }

    fn from_parts(config: &DqnConfig, online: A, memory: ReplayMemory) -> Result<Self> {
        let sync = config.target_sync()?;

        let q_values = online.predict(Array2::zeros((1, config.state_size)).view())?;
        if q_values.dim() != (1, config.action_count) {
            return Err(DqnError::dimension_mismatch(
                format!("Q-values of shape {:?}", (1, config.action_count)),
                format!("{:?}", q_values.dim()),
            ));
        }

        let lagging = sync.uses_lagging().then(|| online.clone());

        debug!(?sync, batch_size = config.batch_size, replay_capacity = config.replay_capacity, "agent created");

        Ok(DqnAgent {
            online,
            lagging,
            memory,
            sync,
            discount_factor: config.discount_factor,
            batch_size: config.batch_size,
            training_epochs: config.training_epochs,
            memory_interval: config.memory_interval,
            verbosity: Verbosity::Silent,
            episode: EpisodeStats::default(),
            error_stats: RunningErrorStats::new(),
            sink: Box::new(TracingSink),
        })
    }

    /// Replace the diagnostics sink (a [`TracingSink`] by default).
    pub fn with_sink<S: DiagnosticsSink + Send + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replace the replay memory, e.g. to inject a seeded random source.
    /// Stored transitions of the previous memory are dropped.
    pub fn with_memory(mut self, memory: ReplayMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Greedy action for a single state.
    pub fn optimal_action(&self, state: ArrayView1<f64>) -> Result<usize> {
        let q_values = self.online.predict(state.insert_axis(Axis(0)))?;
        if q_values.ncols() == 0 {
            return Err(DqnError::Numerical("approximator returned no Q-values".to_string()));
        }
        argmax_rows(q_values.view())
            .get(0)
            .copied()
            .ok_or_else(|| DqnError::Numerical("approximator returned an empty batch".to_string()))
    }

    /// Record one environment step and keep the lagging approximator in sync.
    pub fn on_step(&mut self, step: usize, global_step: usize, transition: Transition) {
        if global_step % self.memory_interval == 0 {
            self.memory.push(transition);
        }

        if let (Some(action), Some(lagging)) = (self.sync.on_step(global_step), self.lagging.as_mut()) {
            match action {
                SyncAction::Hard => {
                    self.online.copy_parameters_to(lagging);
                    debug!(step, global_step, "hard target sync");
                }
                SyncAction::Soft(blend) => {
                    self.online.soft_copy_parameters_to(lagging, blend);
                    trace!(step, global_step, blend, "soft target sync");
                }
            }
        }
    }

    /// Train on one sampled batch once the memory holds at least `batch_size`
    /// transitions. Returns `None` when there was not enough experience yet.
    pub fn on_train(&mut self) -> Result<Option<TrainingReport>> {
        if self.memory.len() < self.batch_size {
            return Ok(None);
        }

        let batch = self.memory.sample(self.batch_size);
        let avg_batch_error = train_on_batch(
            &mut self.online,
            self.lagging.as_ref(),
            &batch,
            self.discount_factor,
            self.training_epochs,
            self.verbosity,
        )?;
        self.episode = self.episode.record(avg_batch_error);

        debug!(
            avg_batch_error,
            trainings_done = self.episode.trainings_done,
            episode_error_avg = self.episode.error_avg,
            "trained on batch"
        );

        Ok(Some(TrainingReport {
            avg_batch_error,
            trainings_done: self.episode.trainings_done,
            episode_error_avg: self.episode.error_avg,
        }))
    }

    /// Close an episode: episode-end sync, statistics, diagnostics, reset.
    /// Returns the statistics of the episode that just ended.
    pub fn on_episode_end(&mut self, episode: usize) -> EpisodeStats {
        if let (Some(SyncAction::Hard), Some(lagging)) = (self.sync.on_episode_end(), self.lagging.as_mut()) {
            self.online.copy_parameters_to(lagging);
            debug!(episode, "episode-end target sync");
        }

        let finished = self.episode;
        self.error_stats.update(finished.error_avg);
        let moving_average = self.error_stats.moving_average();

        self.report(episode, finished.error_avg, Series::EpisodeError);
        self.report(episode, moving_average, Series::MovingAverage);
        info!(
            episode,
            error_avg = finished.error_avg,
            moving_average,
            trainings = finished.trainings_done,
            "episode finished"
        );

        self.episode = EpisodeStats::default();
        finished
    }

    fn report(&mut self, episode: usize, value: f64, series: Series) {
        if let Err(err) = self.sink.record(episode, value, series) {
            warn!(episode, %series, error = %err, "diagnostics sink failed");
        }
    }

    /// Persist the online approximator.
    pub fn save_state<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.online.save_state(path.as_ref())
    }

    /// Load the online approximator. The lagging copy, if any, is rebuilt
    /// from the loaded parameters.
    pub fn load_state<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.online.load_state(path.as_ref())?;
        if self.lagging.is_some() {
            self.lagging = Some(self.online.clone());
        }
        Ok(())
    }

    /// Configuration and approximator parameters as text.
    pub fn parameter_summary(&self) -> String {
        format!(
            "DqnAgent: sync={:?} discount={} batch_size={} epochs={} memory_interval={} memory={}/{}\n{}",
            self.sync,
            self.discount_factor,
            self.batch_size,
            self.training_epochs,
            self.memory_interval,
            self.memory.len(),
            self.memory.capacity(),
            self.online.parameter_summary()
        )
    }

    pub fn online(&self) -> &A {
        &self.online
    }

    pub fn online_mut(&mut self) -> &mut A {
        &mut self.online
    }

    pub fn lagging(&self) -> Option<&A> {
        self.lagging.as_ref()
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn sync_policy(&self) -> TargetSync {
        self.sync
    }

    pub fn episode_stats(&self) -> EpisodeStats {
        self.episode
    }

    pub fn trainings_done(&self) -> usize {
        self.episode.trainings_done
    }

    pub fn episode_error_avg(&self) -> f64 {
        self.episode.error_avg
    }

    pub fn error_stats(&self) -> &RunningErrorStats {
        &self.error_stats
    }
}

/// Bellman targets for a batch: `reward` for terminal transitions, otherwise
/// `reward + discount_factor * max_next_q`.
pub fn bellman_targets(batch: &[&Transition], max_next_q: ArrayView1<f64>, discount_factor: f64) -> Array1<f64> {
    batch
        .iter()
        .zip(max_next_q.iter())
        .map(|(transition, &max_q)| {
            if transition.done {
                transition.reward
            } else {
                transition.reward + discount_factor * max_q
            }
        })
        .collect()
}

/// Stack the `state`s (or `next_state`s) of a batch into rows, preserving order.
fn stack_states<F>(batch: &[&Transition], select: F) -> Result<Array2<f64>>
where
    F: Fn(&Transition) -> &Array1<f64>,
{
    let state_size = batch.first().map_or(0, |t| select(*t).len());
    let mut stacked = Array2::zeros((batch.len(), state_size));
    for (i, transition) in batch.iter().enumerate() {
        let state = select(*transition);
        if state.len() != state_size {
            return Err(DqnError::dimension_mismatch(
                format!("states of length {}", state_size),
                format!("length {} at batch position {}", state.len(), i),
            ));
        }
        stacked.row_mut(i).assign(state);
    }
    Ok(stacked)
}

/// One temporal-difference update of `online` on `batch`.
///
/// Targets start as the online predictions for `states`; only the entry of
/// the action taken in each row is overwritten with its Bellman target, so the
/// other outputs contribute no error. Bootstrap values come from `lagging`
/// when present. Returns the mean absolute TD error of the batch.
pub fn train_on_batch<A: FunctionApproximator>(
    online: &mut A,
    lagging: Option<&A>,
    batch: &[&Transition],
    discount_factor: f64,
    epochs: usize,
    verbosity: Verbosity,
) -> Result<f64> {
    if batch.is_empty() {
        return Err(DqnError::Numerical("cannot train on an empty batch".to_string()));
    }

    let states = stack_states(batch, |t| &t.state)?;
    let next_states = stack_states(batch, |t| &t.next_state)?;

    let mut predicted = online.predict(states.view())?;
    let bootstrap = match lagging {
        Some(lagging) => lagging.predict(next_states.view())?,
        None => online.predict(next_states.view())?,
    };

    let action_count = predicted.ncols();
    if let Some(t) = batch.iter().find(|t| t.action >= action_count) {
        return Err(DqnError::InvalidAction {
            action: t.action,
            max_actions: action_count,
        });
    }

    let targets = bellman_targets(batch, max_rows(bootstrap.view()).view(), discount_factor);

    let mut batch_error = 0.0;
    for (i, (transition, &target)) in batch.iter().zip(targets.iter()).enumerate() {
        let cell = &mut predicted[[i, transition.action]];
        batch_error += (target - *cell).abs();
        *cell = target;
    }

    online.fit(states.view(), predicted.view(), epochs, verbosity)?;

    Ok(batch_error / batch.len() as f64)
}

/// Builder for [`DqnAgent`], mirroring the fields of [`DqnConfig`].
pub struct DqnAgentBuilder {
    config: DqnConfig,
    sink: Option<Box<dyn DiagnosticsSink + Send>>,
    verbosity: Verbosity,
}

impl DqnAgentBuilder {
    pub fn new(state_size: usize, action_count: usize) -> Self {
        DqnAgentBuilder {
            config: DqnConfig::new(state_size, action_count, 0.001, 0.99, 10_000, 32),
            sink: None,
            verbosity: Verbosity::Silent,
        }
    }

    pub fn from_config(config: DqnConfig) -> Self {
        DqnAgentBuilder {
            config,
            sink: None,
            verbosity: Verbosity::Silent,
        }
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn discount_factor(mut self, discount_factor: f64) -> Self {
        self.config.discount_factor = discount_factor;
        self
    }

    pub fn replay_capacity(mut self, capacity: usize) -> Self {
        self.config.replay_capacity = capacity;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn training_epochs(mut self, epochs: usize) -> Self {
        self.config.training_epochs = epochs;
        self
    }

    pub fn memory_interval(mut self, interval: usize) -> Self {
        self.config.memory_interval = interval;
        self
    }

    /// Raw sync interval: 0 disables, (0, 1) blends, >= 1 hard-copies periodically.
    pub fn target_sync_interval(mut self, interval: f64) -> Self {
        self.config.target_sync_interval = interval;
        self
    }

    pub fn sync_on_episode_end(mut self, enabled: bool) -> Self {
        self.config.sync_on_episode_end = enabled;
        self
    }

    pub fn hidden_layers(mut self, sizes: &[usize]) -> Self {
        self.config.hidden_layers = sizes.to_vec();
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.config.optimizer = optimizer;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn sink<S: DiagnosticsSink + Send + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Build an agent around the default network.
    pub fn build(self) -> Result<DqnAgent> {
        let agent = DqnAgent::new(self.config)?;
        Ok(Self::finish(agent, self.sink, self.verbosity))
    }

    /// Build an agent around a caller-supplied approximator.
    pub fn build_with<A: FunctionApproximator>(self, approximator: A) -> Result<DqnAgent<A>> {
        let agent = DqnAgent::with_approximator(self.config, approximator)?;
        Ok(Self::finish(agent, self.sink, self.verbosity))
    }

    fn finish<A: FunctionApproximator>(
        mut agent: DqnAgent<A>,
        sink: Option<Box<dyn DiagnosticsSink + Send>>,
        verbosity: Verbosity,
    ) -> DqnAgent<A> {
        if let Some(sink) = sink {
            agent.sink = sink;
        }
        agent.verbosity = verbosity;
        agent
    }
}
