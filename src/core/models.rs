//! Records exchanged between the orchestrator, the worker processes and the
//! monitor. JSON field names follow the worker wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration handed to one worker process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub seed: u64,
    #[serde(rename = "lr", alias = "learning_rate")]
    pub learning_rate: f64,
    #[serde(rename = "epochs", alias = "epoch_count")]
    pub epoch_count: u32,
    #[serde(rename = "n_samples", alias = "sample_count")]
    pub sample_count: usize,
    #[serde(rename = "n_features", alias = "feature_count")]
    pub feature_count: usize,
    #[serde(
        rename = "repeats",
        alias = "repeat_count",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub repeat_count: Option<u32>,
}

impl WorkloadConfig {
    pub fn new(
        seed: u64,
        learning_rate: f64,
        epoch_count: u32,
        sample_count: usize,
        feature_count: usize,
    ) -> Self {
        Self {
            seed,
            learning_rate,
            epoch_count,
            sample_count,
            feature_count,
            repeat_count: None,
        }
    }

    pub fn with_repeat_count(mut self, repeat_count: u32) -> Self {
        self.repeat_count = Some(repeat_count);
        self
    }

    /// Single JSON argument passed on the worker command line
    pub fn to_argument(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Record printed by a worker that finished training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSuccess {
    pub pid: u32,
    pub seed: u64,
    #[serde(rename = "lr")]
    pub learning_rate: f64,
    #[serde(rename = "epochs")]
    pub epoch_count: u32,
    #[serde(rename = "n_samples")]
    pub sample_count: usize,
    #[serde(rename = "n_features")]
    pub feature_count: usize,
    pub train_time_sec: f64,
    pub accuracy: f64,
}

/// Record synthesized by the orchestrator when a worker fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub pid: u32,
    pub seed: u64,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_out_tail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_err_tail: Option<String>,
}

/// Exactly one per configuration per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerResult {
    Success(WorkerSuccess),
    Failure(WorkerFailure),
}

impl WorkerResult {
    pub fn pid(&self) -> u32 {
        match self {
            WorkerResult::Success(success) => success.pid,
            WorkerResult::Failure(failure) => failure.pid,
        }
    }

    pub fn seed(&self) -> u64 {
        match self {
            WorkerResult::Success(success) => success.seed,
            WorkerResult::Failure(failure) => failure.seed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WorkerResult::Success(_))
    }

    pub fn train_time_sec(&self) -> Option<f64> {
        match self {
            WorkerResult::Success(success) => Some(success.train_time_sec),
            WorkerResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WorkerResult::Success(_) => None,
            WorkerResult::Failure(failure) => Some(&failure.error),
        }
    }
}

/// OS-level resource usage observed for one process identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMetrics {
    pub pid: u32,
    pub samples: u64,
    pub cpu_avg: f64,
    pub cpu_peak: f64,
    pub rss_peak_mb: f64,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub duration_sec_monitored: f64,
    pub alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Worker result with the monitor's metrics attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    #[serde(flatten)]
    pub result: WorkerResult,
    /// Serial mode only: spawn-to-join wall time of this worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_time_one_sec: Option<f64>,
    pub os_metrics: Option<ProcessMetrics>,
}

impl MergedResult {
    pub fn new(result: WorkerResult, os_metrics: Option<ProcessMetrics>) -> Self {
        Self {
            result,
            wall_time_one_sec: None,
            os_metrics,
        }
    }

    pub fn with_wall_time(mut self, seconds: f64) -> Self {
        self.wall_time_one_sec = Some(seconds);
        self
    }

    pub fn pid(&self) -> u32 {
        self.result.pid()
    }

    pub fn seed(&self) -> u64 {
        self.result.seed()
    }
}

/// Aggregate over one run's merged results
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(rename = "workers")]
    pub worker_count: usize,
    #[serde(rename = "train_time_avg_sec")]
    pub avg_compute_time: f64,
    #[serde(rename = "rss_peak_max_mb")]
    pub max_rss_peak_mb: f64,
    #[serde(rename = "rss_peak_avg_mb")]
    pub avg_rss_peak_mb: f64,
    #[serde(rename = "cpu_avg_avg")]
    pub avg_cpu_avg: f64,
    #[serde(rename = "cpu_peak_max")]
    pub max_cpu_peak: f64,
}

impl RunSummary {
    /// Report lines in a fixed order, keyed by the serialized names
    ///
    /// Floats always keep a decimal point (`3.0`, never `3`).
    pub fn key_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("workers", self.worker_count.to_string()),
            ("train_time_avg_sec", format!("{:?}", self.avg_compute_time)),
            ("rss_peak_max_mb", format!("{:?}", self.max_rss_peak_mb)),
            ("rss_peak_avg_mb", format!("{:?}", self.avg_rss_peak_mb)),
            ("cpu_avg_avg", format!("{:?}", self.avg_cpu_avg)),
            ("cpu_peak_max", format!("{:?}", self.max_cpu_peak)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Concurrent,
    Serial,
}

impl ExecutionMode {
    /// Prefix used on progress lines
    pub fn tag(&self) -> &'static str {
        match self {
            ExecutionMode::Concurrent => "PAR",
            ExecutionMode::Serial => "SEQ",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Concurrent => f.write_str("concurrent"),
            ExecutionMode::Serial => f.write_str("serial"),
        }
    }
}

/// Everything one execution mode produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub mode: ExecutionMode,
    /// Sorted by ascending seed
    pub results: Vec<MergedResult>,
    pub total_wall_time_sec: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_workload_config_uses_worker_wire_names() {
        let config = WorkloadConfig::new(3, 0.005, 4000, 5000, 30);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({"seed": 3, "lr": 0.005, "epochs": 4000, "n_samples": 5000, "n_features": 30})
        );

        let with_repeats = config.with_repeat_count(2);
        let value = serde_json::to_value(&with_repeats).unwrap();
        assert_eq!(value["repeats"], json!(2));
    }

    #[test]
    fn test_workload_config_accepts_long_names() {
        let config: WorkloadConfig = serde_json::from_value(json!({
            "seed": 1,
            "learning_rate": 0.1,
            "epoch_count": 5,
            "sample_count": 10,
            "feature_count": 2
        }))
        .unwrap();
        assert_eq!(config, WorkloadConfig::new(1, 0.1, 5, 10, 2));
    }

    #[test]
    fn test_merged_failure_serializes_flat() {
        let failure = WorkerResult::Failure(WorkerFailure {
            pid: 42,
            seed: 9,
            error: "boom".to_string(),
            exit_code: Some(3),
            raw_out_tail: None,
            raw_err_tail: None,
        });
        let merged = MergedResult::new(failure, None);
        let value = serde_json::to_value(&merged).unwrap();
        assert_eq!(
            value,
            json!({"pid": 42, "seed": 9, "error": "boom", "exit_code": 3, "os_metrics": null})
        );
    }

    #[test]
    fn test_worker_result_untagged_parse() {
        let success: WorkerResult = serde_json::from_value(json!({
            "pid": 10, "seed": 1, "lr": 0.01, "epochs": 4, "n_samples": 8,
            "n_features": 2, "train_time_sec": 0.5, "accuracy": 0.75
        }))
        .unwrap();
        assert!(success.is_success());
        assert_eq!(success.train_time_sec(), Some(0.5));

        let failure: WorkerResult =
            serde_json::from_value(json!({"pid": 11, "seed": 2, "error": "nope"})).unwrap();
        assert_eq!(failure.error(), Some("nope"));
        assert_eq!(failure.train_time_sec(), None);
    }

    #[test]
    fn test_summary_whole_floats_keep_decimal_point() {
        let summary = RunSummary {
            worker_count: 2,
            avg_compute_time: 3.0,
            max_cpu_peak: 100.0,
            ..RunSummary::default()
        };
        let values: Vec<String> = summary
            .key_values()
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        assert_eq!(values, vec!["2", "3.0", "0.0", "0.0", "0.0", "100.0"]);
    }

    #[test]
    fn test_summary_key_order() {
        let keys: Vec<_> = RunSummary::default()
            .key_values()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(
            keys,
            vec![
                "workers",
                "train_time_avg_sec",
                "rss_peak_max_mb",
                "rss_peak_avg_mb",
                "cpu_avg_avg",
                "cpu_peak_max"
            ]
        );
    }
}
