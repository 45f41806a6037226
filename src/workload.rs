//! Bundled compute workload: logistic regression by batch gradient descent
//!
//! Deterministic per seed. Only the training loop is timed.

use crate::config::TIME_PRECISION;
use crate::core::models::{WorkerSuccess, WorkloadConfig};
use crate::utils::round_to;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Box-Muller draw from N(0, 1)
fn standard_normal(rng: &mut StdRng) -> f64 {
    // (0, 1] keeps ln away from zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn accuracy(x: &Array2<f64>, weights: &Array1<f64>, labels: &Array1<f64>) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = x
        .dot(weights)
        .iter()
        .zip(labels.iter())
        .filter(|(z, label)| (sigmoid(**z) > 0.5) == (**label > 0.5))
        .count();
    correct as f64 / labels.len() as f64
}

/// Train once on a synthetic, linearly separable dataset
pub fn train(config: &WorkloadConfig) -> WorkerSuccess {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let samples = config.sample_count;
    let features = config.feature_count;

    let x = Array2::from_shape_simple_fn((samples, features), || standard_normal(&mut rng));
    let true_weights = Array1::from_shape_simple_fn(features, || standard_normal(&mut rng));
    let labels = x
        .dot(&true_weights)
        .mapv(|z| if sigmoid(z) > 0.5 { 1.0 } else { 0.0 });

    let mut weights = Array1::<f64>::zeros(features);
    let scale = 1.0 / samples.max(1) as f64;

    let started = Instant::now();
    for _ in 0..config.epoch_count {
        let predictions = x.dot(&weights).mapv(sigmoid);
        let gradient = x.t().dot(&(predictions - &labels)) * scale;
        weights.scaled_add(-config.learning_rate, &gradient);
    }
    let train_time = started.elapsed();

    WorkerSuccess {
        pid: std::process::id(),
        seed: config.seed,
        learning_rate: config.learning_rate,
        epoch_count: config.epoch_count,
        sample_count: samples,
        feature_count: features,
        train_time_sec: round_to(train_time.as_secs_f64(), TIME_PRECISION),
        accuracy: round_to(accuracy(&x, &weights, &labels), TIME_PRECISION),
    }
}

/// Train `repeat_count` times (at least once) and keep the last result
pub fn run(config: &WorkloadConfig) -> WorkerSuccess {
    let repeats = config.repeat_count.unwrap_or(1).max(1);
    let mut last = train(config);
    for _ in 1..repeats {
        last = train(config);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_learns_separable_data() {
        let config = WorkloadConfig::new(7, 0.5, 200, 400, 5);
        let result = train(&config);
        assert_eq!(result.seed, 7);
        assert_eq!(result.pid, std::process::id());
        assert_eq!(result.sample_count, 400);
        assert!(result.accuracy > 0.8, "accuracy {}", result.accuracy);
        assert!(result.train_time_sec >= 0.0);
    }

    #[test]
    fn test_same_seed_same_accuracy() {
        let config = WorkloadConfig::new(3, 0.1, 50, 100, 4);
        assert_eq!(train(&config).accuracy, train(&config).accuracy);
    }

    #[test]
    fn test_zero_epochs_still_reports() {
        let config = WorkloadConfig::new(1, 0.1, 0, 10, 2);
        let result = train(&config);
        assert_eq!(result.epoch_count, 0);
        assert!((0.0..=1.0).contains(&result.accuracy));
    }

    #[test]
    fn test_repeats_run_at_least_once() {
        let config = WorkloadConfig::new(2, 0.1, 5, 20, 2).with_repeat_count(0);
        assert_eq!(run(&config).seed, 2);
    }
}
