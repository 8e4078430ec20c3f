//! # Replay Memory
//!
//! Fixed-capacity ring buffer of [`Transition`]s with uniform sampling without
//! replacement. Once the buffer is full every push overwrites the oldest slot.
//!
//! ```rust
//! use deepq::replay_memory::{ReplayMemory, Transition};
//! use ndarray::array;
//!
//! let mut memory = ReplayMemory::with_seed(100, 7).unwrap();
//! memory.push(Transition::new(array![0.1, 0.2], 1, 1.0, array![0.2, 0.3], false));
//! assert_eq!(memory.len(), 1);
//! let batch = memory.sample(1);
//! assert_eq!(batch[0].action, 1);
//! ```

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};

/// One recorded interaction step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: Array1<f64>,
    pub action: usize,
    pub reward: f64,
    pub next_state: Array1<f64>,
    pub done: bool,
}

impl Transition {
    pub fn new(
        state: Array1<f64>,
        action: usize,
        reward: f64,
        next_state: Array1<f64>,
        done: bool,
    ) -> Self {
        Transition {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Ring buffer of transitions.
///
/// Sampling borrows the buffer mutably only to advance the random source;
/// stored transitions are never moved or removed by a sample.
pub struct ReplayMemory {
    slots: Vec<Transition>,
    capacity: usize,
    /// Slot that the next push writes to once the buffer is full
    next: usize,
    rng: StdRng,
}

impl ReplayMemory {
    /// Create a memory whose random source is seeded from OS entropy.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    /// Create a memory with a reproducible random source.
    pub fn with_seed(capacity: usize, seed: u64) -> Result<Self> {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(capacity: usize, rng: StdRng) -> Result<Self> {
        if capacity == 0 {
            return Err(DqnError::invalid_config(
                "replay_capacity",
                "Capacity must be greater than 0",
            ));
        }

        Ok(ReplayMemory {
            slots: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            rng,
        })
    }

    pub fn push(&mut self, transition: Transition) {
        if self.slots.len() < self.capacity {
            self.slots.push(transition);
        } else {
            self.slots[self.next] = transition;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    /// Draw `batch_size` distinct transitions uniformly at random.
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` exceeds the number of stored transitions. Callers
    /// are expected to check [`ReplayMemory::len`] first.
    pub fn sample(&mut self, batch_size: usize) -> Vec<&Transition> {
        assert!(
            batch_size <= self.slots.len(),
            "cannot sample {} transitions from a memory holding {}",
            batch_size,
            self.slots.len()
        );

        index::sample(&mut self.rng, self.slots.len(), batch_size)
            .into_iter()
            .map(|i| &self.slots[i])
            .collect()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate stored transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.is_full() { self.next } else { 0 };
        let (newer, older) = self.slots.split_at(split);
        older.iter().chain(newer.iter())
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.next = 0;
    }
}
