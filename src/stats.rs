//! Error statistics kept by the agent.
//!
//! [`EpisodeStats`] is the per-episode running mean of batch errors and is reset
//! at every episode boundary. [`RunningErrorStats`] accumulates the per-episode
//! values across the whole run and exposes a bounded moving average.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Window of the moving average over per-episode errors
pub const MOVING_AVERAGE_WINDOW: usize = 100;

/// Mean absolute TD error of the trainings done in the current episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub trainings_done: usize,
    pub error_avg: f64,
}

impl EpisodeStats {
    /// Fold one batch's average error into the incremental mean.
    #[must_use]
    pub fn record(self, avg_batch_error: f64) -> Self {
        let trainings_done = self.trainings_done + 1;
        let error_avg = self.error_avg + (avg_batch_error - self.error_avg) / trainings_done as f64;
        EpisodeStats {
            trainings_done,
            error_avg,
        }
    }
}

/// Incremental mean of every value seen plus a moving average over the
/// most recent [`MOVING_AVERAGE_WINDOW`] values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningErrorStats {
    count: usize,
    mean: f64,
    window: VecDeque<f64>,
    window_size: usize,
}

impl RunningErrorStats {
    pub fn new() -> Self {
        Self::with_window(MOVING_AVERAGE_WINDOW)
    }

    pub fn with_window(window_size: usize) -> Self {
        RunningErrorStats {
            count: 0,
            mean: 0.0,
            window: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
        }
    }

    /// Update with a new value
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;

        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(value);
    }

    /// Mean of all values seen so far
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Mean of the values currently inside the window, 0 when empty
    pub fn moving_average(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.window.iter().sum::<f64>() / self.window.len() as f64
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Reset the statistics
    pub fn reset(&mut self) {
        *self = Self::with_window(self.window_size);
    }
}

impl Default for RunningErrorStats {
    fn default() -> Self {
        Self::new()
    }
}
