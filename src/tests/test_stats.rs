use approx::assert_relative_eq;

use crate::stats::{EpisodeStats, RunningErrorStats, MOVING_AVERAGE_WINDOW};

#[test]
fn test_episode_stats_is_arithmetic_mean() {
    let errors = [0.5, 2.0, 1.25, 7.0, 0.0, 3.5];
    let stats = errors.iter().fold(EpisodeStats::default(), |s, &e| s.record(e));

    assert_eq!(stats.trainings_done, errors.len());
    assert_relative_eq!(stats.error_avg, errors.iter().sum::<f64>() / errors.len() as f64, epsilon = 1e-12);
}

#[test]
fn test_episode_stats_default_is_zero() {
    let stats = EpisodeStats::default();
    assert_eq!(stats.trainings_done, 0);
    assert_eq!(stats.error_avg, 0.0);
}

#[test]
fn test_moving_average_uses_last_hundred() {
    let mut stats = RunningErrorStats::new();
    for i in 0..150 {
        stats.update(i as f64);
    }

    assert_eq!(stats.count(), 150);
    assert_eq!(stats.window_len(), MOVING_AVERAGE_WINDOW);
    // mean of 50..150
    assert_relative_eq!(stats.moving_average(), 99.5, epsilon = 1e-9);
    assert_relative_eq!(stats.mean(), 74.5, epsilon = 1e-9);
}

#[test]
fn test_moving_average_before_window_fills() {
    let mut stats = RunningErrorStats::new();
    assert_eq!(stats.moving_average(), 0.0);

    stats.update(3.0);
    stats.update(5.0);
    assert_eq!(stats.window_len(), 2);
    assert_relative_eq!(stats.moving_average(), 4.0);
    assert_relative_eq!(stats.mean(), 4.0);
}

#[test]
fn test_custom_window_and_reset() {
    let mut stats = RunningErrorStats::with_window(3);
    for value in [1.0, 2.0, 3.0, 10.0] {
        stats.update(value);
    }
    assert_relative_eq!(stats.moving_average(), 5.0);
    assert_relative_eq!(stats.mean(), 4.0);

    stats.reset();
    assert_eq!(stats.count(), 0);
    assert_eq!(stats.window_len(), 0);
    assert_eq!(stats.moving_average(), 0.0);

    stats.update(8.0);
    assert_relative_eq!(stats.moving_average(), 8.0);
}
