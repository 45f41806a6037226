//! Runs one set of workloads two ways, all at once and strictly one after
//! another, and attaches the monitor's per-process metrics to each worker's
//! record.

pub mod aggregator;

pub use aggregator::summarize;

use crate::config::{validate_unique_seeds, MONITOR_JOIN_TIMEOUT, TIME_PRECISION};
use crate::core::models::{
    ExecutionMode, MergedResult, ProcessMetrics, RunOutcome, RunSummary, WorkerResult,
    WorkloadConfig,
};
use crate::error::{BenchError, BenchResult};
use crate::monitor::probe::{default_probe, ProcessProbe};
use crate::monitor::ProcessMonitor;
use crate::supervisor::{CompletedWorker, RunningWorker, WorkloadLauncher};
use crate::utils::round_to;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Drives worker processes and the process monitor for both execution modes
pub struct Orchestrator {
    launcher: WorkloadLauncher,
    probe: Arc<dyn ProcessProbe>,
    join_timeout: Duration,
    progress: bool,
}

impl Orchestrator {
    pub fn new(launcher: WorkloadLauncher) -> Self {
        Self {
            launcher,
            probe: default_probe(),
            join_timeout: MONITOR_JOIN_TIMEOUT,
            progress: true,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Upper bound on waiting for the monitor after the workers are done
    pub fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }

    /// Print `[PAR]`/`[SEQ]` progress lines to stdout
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn launcher(&self) -> &WorkloadLauncher {
        &self.launcher
    }

    /// Launch every worker at once, monitor them as one set, then collect
    ///
    /// Outputs are collected in launch order; the workers themselves are
    /// already running side by side. A launch failure aborts the run and
    /// kills the workers started so far.
    pub async fn run_concurrent(
        &self,
        configs: &[WorkloadConfig],
        sample_interval: Duration,
    ) -> BenchResult<RunOutcome> {
        let mode = ExecutionMode::Concurrent;
        check_inputs(configs, sample_interval)?;
        info!(workers = configs.len(), %mode, "run started");

        let started = Instant::now();

        let mut running = Vec::with_capacity(configs.len());
        for config in configs {
            let worker = self.launcher.spawn(config)?;
            self.report_started(mode, &worker);
            running.push(worker);
        }

        let pids: Vec<u32> = running.iter().map(RunningWorker::pid).collect();
        let monitor = self.monitor(sample_interval).start(&pids);

        let mut finished = Vec::with_capacity(running.len());
        for worker in running {
            let completed = worker.collect().await;
            self.report_finished(mode, &completed);
            finished.push(completed.result);
        }

        let mut metrics = monitor.join(self.join_timeout).await;
        let total_wall_time_sec = round_to(started.elapsed().as_secs_f64(), TIME_PRECISION);

        let mut results: Vec<MergedResult> = finished
            .into_iter()
            .map(|result| merge(result, &mut metrics))
            .collect();
        sort_by_seed(&mut results);

        info!(%mode, total_wall_time_sec, "run finished");
        Ok(RunOutcome {
            mode,
            results,
            total_wall_time_sec,
        })
    }

    /// Run the workers one at a time, each under its own monitor
    pub async fn run_serial(
        &self,
        configs: &[WorkloadConfig],
        sample_interval: Duration,
    ) -> BenchResult<RunOutcome> {
        let mode = ExecutionMode::Serial;
        check_inputs(configs, sample_interval)?;
        info!(workers = configs.len(), %mode, "run started");

        let started = Instant::now();
        let mut results = Vec::with_capacity(configs.len());

        for config in configs {
            let one_started = Instant::now();
            let worker = self.launcher.spawn(config)?;
            self.report_started(mode, &worker);

            let monitor = self.monitor(sample_interval).start(&[worker.pid()]);
            let completed = worker.collect().await;
            let mut metrics = monitor.join(self.join_timeout).await;
            let wall_time = round_to(one_started.elapsed().as_secs_f64(), TIME_PRECISION);

            self.report_finished(mode, &completed);
            results.push(merge(completed.result, &mut metrics).with_wall_time(wall_time));
        }

        let total_wall_time_sec = round_to(started.elapsed().as_secs_f64(), TIME_PRECISION);
        sort_by_seed(&mut results);

        info!(%mode, total_wall_time_sec, "run finished");
        Ok(RunOutcome {
            mode,
            results,
            total_wall_time_sec,
        })
    }

    pub fn summarize(results: &[MergedResult]) -> RunSummary {
        summarize(results)
    }

    fn monitor(&self, sample_interval: Duration) -> ProcessMonitor {
        ProcessMonitor::with_probe(Arc::clone(&self.probe), sample_interval)
    }

    fn report_started(&self, mode: ExecutionMode, worker: &RunningWorker) {
        if !self.progress {
            return;
        }
        let config = worker
            .config()
            .to_argument()
            .unwrap_or_else(|_| format!("seed={}", worker.config().seed));
        println!("[{}] Started PID={} cfg={}", mode.tag(), worker.pid(), config);
    }

    fn report_finished(&self, mode: ExecutionMode, completed: &CompletedWorker) {
        let seed = completed.result.seed();
        if let Some(error) = completed.result.error() {
            warn!(pid = completed.pid, seed, %mode, error, "worker did not produce a result");
        }
        if !self.progress {
            return;
        }
        match completed.result.error() {
            None => println!(
                "[{}] Finished PID={} seed={} in {:?} sec",
                mode.tag(),
                completed.pid,
                seed,
                completed.elapsed_secs()
            ),
            Some(error) => println!(
                "[{}] Failed PID={} seed={}: {}",
                mode.tag(),
                completed.pid,
                seed,
                error
            ),
        }
    }
}

fn check_inputs(configs: &[WorkloadConfig], sample_interval: Duration) -> BenchResult<()> {
    if sample_interval.is_zero() {
        return Err(BenchError::validation(
            "sample_interval",
            "must be greater than zero",
        ));
    }
    validate_unique_seeds(configs)
}

/// Attach the metrics recorded for the record's identifier, if any
fn merge(result: WorkerResult, metrics: &mut HashMap<u32, ProcessMetrics>) -> MergedResult {
    let os_metrics = metrics.remove(&result.pid());
    MergedResult::new(result, os_metrics)
}

fn sort_by_seed(results: &mut [MergedResult]) {
    results.sort_by_key(MergedResult::seed);
}
