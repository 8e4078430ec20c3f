//! Target-network synchronization policy.
//!
//! The policy is resolved once from two raw configuration values, a numeric
//! interval and an "on episode end" flag, and never changes afterwards.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DqnError, Result};

/// How the lagging approximator follows the online one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum TargetSync {
    /// No lagging copy; bootstrap targets come from the online approximator.
    #[default]
    Disabled,
    /// Full parameter copy every `steps` global steps.
    HardPeriodic { steps: usize },
    /// Every step, move a `blend` fraction toward the online parameters.
    Soft { blend: f64 },
    /// Full parameter copy at each episode boundary.
    EpisodeEnd,
}

/// Work the agent has to do on the lagging approximator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SyncAction {
    Hard,
    Soft(f64),
}

impl TargetSync {
    /// Resolve the policy from raw configuration.
    ///
    /// Precedence: the episode-end flag wins, then an interval of at least 1
    /// (truncated to whole steps), then an interval in `(0, 1)` as a blend
    /// factor. Zero disables the lagging approximator. Negative and non-finite
    /// intervals are rejected.
    pub fn resolve(interval: f64, sync_on_episode_end: bool) -> Result<Self> {
        if !interval.is_finite() || interval < 0.0 {
            return Err(DqnError::invalid_config(
                "target_sync_interval",
                format!("must be a finite value >= 0, got {}", interval),
            ));
        }

        if sync_on_episode_end {
            if interval > 0.0 {
                warn!(
                    interval,
                    "sync_on_episode_end is set; target_sync_interval is ignored"
                );
            }
            return Ok(TargetSync::EpisodeEnd);
        }

        let policy = if interval >= 1.0 {
            TargetSync::HardPeriodic {
                steps: interval.trunc() as usize,
            }
        } else if interval > 0.0 {
            TargetSync::Soft { blend: interval }
        } else {
            TargetSync::Disabled
        };
        Ok(policy)
    }

    /// Whether a lagging approximator exists under this policy.
    pub fn uses_lagging(&self) -> bool {
        !matches!(self, TargetSync::Disabled)
    }

    /// Sync work due after global step `global_step`.
    pub fn on_step(&self, global_step: usize) -> Option<SyncAction> {
        match *self {
            TargetSync::HardPeriodic { steps } if global_step % steps == 0 => Some(SyncAction::Hard),
            TargetSync::Soft { blend } => Some(SyncAction::Soft(blend)),
            _ => None,
        }
    }

    /// Sync work due at an episode boundary.
    pub fn on_episode_end(&self) -> Option<SyncAction> {
        match self {
            TargetSync::EpisodeEnd => Some(SyncAction::Hard),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(TargetSync::resolve(0.0, false).unwrap(), TargetSync::Disabled);
        assert_eq!(TargetSync::resolve(0.01, false).unwrap(), TargetSync::Soft { blend: 0.01 });
        assert_eq!(TargetSync::resolve(1.0, false).unwrap(), TargetSync::HardPeriodic { steps: 1 });
        assert_eq!(TargetSync::resolve(250.7, false).unwrap(), TargetSync::HardPeriodic { steps: 250 });
        assert_eq!(TargetSync::resolve(0.0, true).unwrap(), TargetSync::EpisodeEnd);
        assert_eq!(TargetSync::resolve(100.0, true).unwrap(), TargetSync::EpisodeEnd);
        assert_eq!(TargetSync::resolve(0.5, true).unwrap(), TargetSync::EpisodeEnd);
    }

    #[test]
    fn test_resolve_rejects_bad_intervals() {
        assert!(TargetSync::resolve(-1.0, false).is_err());
        assert!(TargetSync::resolve(f64::NAN, false).is_err());
        assert!(TargetSync::resolve(f64::INFINITY, true).is_err());
    }

    #[test]
    fn test_hard_periodic_fires_on_multiples() {
        let policy = TargetSync::HardPeriodic { steps: 4 };
        let fired: Vec<usize> = (1..=12).filter(|&s| policy.on_step(s).is_some()).collect();
        assert_eq!(fired, vec![4, 8, 12]);
        assert_eq!(policy.on_episode_end(), None);
    }

    #[test]
    fn test_soft_fires_every_step() {
        let policy = TargetSync::Soft { blend: 0.1 };
        for step in 0..5 {
            assert_eq!(policy.on_step(step), Some(SyncAction::Soft(0.1)));
        }
    }

    #[test]
    fn test_episode_end_only_fires_at_boundary() {
        let policy = TargetSync::EpisodeEnd;
        assert!(policy.uses_lagging());
        assert_eq!(policy.on_step(100), None);
        assert_eq!(policy.on_episode_end(), Some(SyncAction::Hard));
        assert!(!TargetSync::Disabled.uses_lagging());
    }
}
