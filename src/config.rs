use crate::core::models::WorkloadConfig;
use crate::error::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const WORKER_BIN_NAME: &str = "procbench-worker";
pub const WORKER_BIN_ENV: &str = "PROCBENCH_WORKER_BIN";
pub const SAMPLE_INTERVAL_ENV: &str = "PROCBENCH_SAMPLE_INTERVAL_MS";

// A worker that exits within one interval is recorded with zero samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);
pub const MONITOR_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters of stdout/stderr kept when a worker prints something unparseable
pub const OUTPUT_TAIL_CHARS: usize = 300;

pub const METRIC_PRECISION: u32 = 4;
pub const TIME_PRECISION: u32 = 6;

pub const CONCURRENT_RESULTS_FILE: &str = "results_parallel.json";
pub const SERIAL_RESULTS_FILE: &str = "results_sequential.json";
pub const REPORT_FILE: &str = "report.txt";

/// The four gradient-descent workloads run when no configuration file is given
pub fn default_workloads() -> Vec<WorkloadConfig> {
    vec![
        WorkloadConfig::new(1, 0.01, 4000, 5000, 30),
        WorkloadConfig::new(2, 0.02, 4000, 5000, 30),
        WorkloadConfig::new(3, 0.005, 4000, 5000, 30),
        WorkloadConfig::new(4, 0.01, 6000, 5000, 30),
    ]
}

/// Worker executable override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Arguments placed before the config JSON argument
    #[serde(default)]
    pub args: Vec<String>,
}

/// Run configuration, loadable from TOML
///
/// ```toml
/// sample_interval_ms = 100
/// monitor_join_timeout_secs = 5
///
/// [worker]
/// path = "/usr/local/bin/procbench-worker"
///
/// [[workloads]]
/// seed = 1
/// learning_rate = 0.01
/// epoch_count = 4000
/// sample_count = 5000
/// feature_count = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    #[serde(default = "default_join_timeout_secs")]
    pub monitor_join_timeout_secs: u64,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default = "default_workloads")]
    pub workloads: Vec<WorkloadConfig>,
}

fn default_sample_interval_ms() -> u64 {
    DEFAULT_SAMPLE_INTERVAL.as_millis() as u64
}

fn default_join_timeout_secs() -> u64 {
    MONITOR_JOIN_TIMEOUT.as_secs()
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            monitor_join_timeout_secs: default_join_timeout_secs(),
            worker: WorkerSettings::default(),
            workloads: default_workloads(),
        }
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> BenchResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            BenchError::config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> BenchResult<Self> {
        let config: BenchConfig =
            toml::from_str(raw).map_err(|err| BenchError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn monitor_join_timeout(&self) -> Duration {
        Duration::from_secs(self.monitor_join_timeout_secs)
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.sample_interval_ms == 0 {
            return Err(BenchError::validation(
                "sample_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.workloads.is_empty() {
            return Err(BenchError::validation(
                "workloads",
                "at least one workload is required",
            ));
        }
        validate_workloads(&self.workloads)
    }
}

/// Seeds must be unique within a run
pub fn validate_unique_seeds(workloads: &[WorkloadConfig]) -> BenchResult<()> {
    let mut seen = HashSet::with_capacity(workloads.len());
    for workload in workloads {
        if !seen.insert(workload.seed) {
            return Err(BenchError::validation(
                "seed",
                format!("duplicate seed {}", workload.seed),
            ));
        }
    }
    Ok(())
}

/// Unique seeds, positive sizes and a positive learning rate
pub fn validate_workloads(workloads: &[WorkloadConfig]) -> BenchResult<()> {
    validate_unique_seeds(workloads)?;
    for workload in workloads {
        if workload.epoch_count == 0 || workload.sample_count == 0 || workload.feature_count == 0
        {
            return Err(BenchError::validation(
                "workloads",
                format!(
                    "seed {}: epoch_count, sample_count and feature_count must be positive",
                    workload.seed
                ),
            ));
        }
        if !workload.learning_rate.is_finite() || workload.learning_rate <= 0.0 {
            return Err(BenchError::validation(
                "learning_rate",
                format!("seed {}: must be a positive number", workload.seed),
            ));
        }
    }
    Ok(())
}
