//! Fixed-interval OS process monitor
//!
//! `ProcessMonitor::start` attaches to every identifier in the caller's
//! context, then hands the attached processes to a tokio task that polls them
//! until all have exited. Each identifier's record is finalized the moment it
//! finishes and is sent over a channel, so a bounded join can return whatever
//! finished in time and drop the rest.

pub mod probe;

use crate::config::{METRIC_PRECISION, TIME_PRECISION};
use crate::core::models::ProcessMetrics;
use crate::utils::round_to;
use chrono::{DateTime, Utc};
use probe::{default_probe, ProbeError, ProcessProbe, TrackedProcess};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initializing,
    Sampling,
    Finished,
    Unreachable,
}

/// Accumulated statistics for one identifier
struct PidState {
    pid: u32,
    phase: Phase,
    handle: Option<Box<dyn TrackedProcess>>,
    samples: u64,
    cpu_sum: f64,
    cpu_peak: f64,
    rss_peak_mb: f64,
    start_ts: DateTime<Utc>,
    end_ts: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl PidState {
    fn new(pid: u32) -> Self {
        Self {
            pid,
            phase: Phase::Initializing,
            handle: None,
            samples: 0,
            cpu_sum: 0.0,
            cpu_peak: 0.0,
            rss_peak_mb: 0.0,
            start_ts: Utc::now(),
            end_ts: None,
            error: None,
        }
    }

    /// Initializing -> Sampling, or Initializing -> Unreachable
    fn attach(pid: u32, probe: &dyn ProcessProbe) -> Self {
        let mut state = Self::new(pid);
        match probe.attach(pid) {
            Ok(mut handle) => {
                // The first reading has no prior baseline; it only primes the counter.
                if let Err(err) = handle.cpu_percent() {
                    debug!(pid, error = %err, "baseline cpu reading failed");
                }
                state.handle = Some(handle);
                state.phase = Phase::Sampling;
            }
            Err(err) => {
                warn!(pid, error = %err, "cannot attach to process");
                state.end_ts = Some(state.start_ts);
                state.error = Some(format!("Process not accessible: {}", err));
                state.phase = Phase::Unreachable;
            }
        }
        state
    }

    fn is_sampling(&self) -> bool {
        self.phase == Phase::Sampling
    }

    /// One polling round for this identifier
    fn poll(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            self.finish(None);
            return;
        };

        if !handle.is_running() {
            self.finish(None);
            return;
        }

        let reading = handle
            .cpu_percent()
            .and_then(|cpu| handle.rss_bytes().map(|rss| (cpu, rss)));
        match reading {
            Ok((cpu, rss)) => self.record(cpu, rss as f64 / BYTES_PER_MB),
            Err(err) => self.finish(Some(err)),
        }
    }

    fn record(&mut self, cpu: f64, rss_mb: f64) {
        self.samples += 1;
        self.cpu_sum += cpu;
        self.cpu_peak = self.cpu_peak.max(cpu);
        self.rss_peak_mb = self.rss_peak_mb.max(rss_mb);
    }

    /// Sampling -> Finished; the end timestamp is only ever taken once
    fn finish(&mut self, sample_error: Option<ProbeError>) {
        if self.end_ts.is_none() {
            self.end_ts = Some(Utc::now());
        }
        if let Some(err) = sample_error {
            debug!(pid = self.pid, samples = self.samples, error = %err, "sampling ended early");
            if !err.is_gone() {
                self.error = Some(err.to_string());
            }
        }
        self.handle = None;
        self.phase = Phase::Finished;
    }

    fn into_metrics(self) -> ProcessMetrics {
        let end_ts = self.end_ts.unwrap_or_else(Utc::now);
        let duration = (end_ts - self.start_ts)
            .to_std()
            .unwrap_or_default()
            .as_secs_f64();
        let cpu_avg = if self.samples > 0 {
            self.cpu_sum / self.samples as f64
        } else {
            0.0
        };

        ProcessMetrics {
            pid: self.pid,
            samples: self.samples,
            cpu_avg: round_to(cpu_avg, METRIC_PRECISION),
            cpu_peak: round_to(self.cpu_peak, METRIC_PRECISION),
            rss_peak_mb: round_to(self.rss_peak_mb, METRIC_PRECISION),
            start_ts: self.start_ts,
            end_ts,
            duration_sec_monitored: round_to(duration, TIME_PRECISION),
            alive: self.phase == Phase::Sampling,
            error: self.error,
        }
    }
}

async fn sampling_loop(
    mut states: Vec<PidState>,
    interval: Duration,
    sender: mpsc::UnboundedSender<ProcessMetrics>,
) {
    let mut round: u64 = 0;
    while !states.is_empty() {
        tokio::time::sleep(interval).await;
        round += 1;

        for state in states.iter_mut() {
            state.poll();
        }

        let (finished, sampling): (Vec<_>, Vec<_>) =
            states.into_iter().partition(|state| !state.is_sampling());
        for state in finished {
            // receiver gone means nobody is waiting for the result any more
            let _ = sender.send(state.into_metrics());
        }
        states = sampling;

        debug!(round, still_running = states.len(), "monitor round complete");
    }
}

/// Polls a set of process identifiers until every one has exited
#[derive(Clone)]
pub struct ProcessMonitor {
    probe: Arc<dyn ProcessProbe>,
    sample_interval: Duration,
}

impl ProcessMonitor {
    pub fn new(sample_interval: Duration) -> Self {
        Self::with_probe(default_probe(), sample_interval)
    }

    pub fn with_probe(probe: Arc<dyn ProcessProbe>, sample_interval: Duration) -> Self {
        Self {
            probe,
            sample_interval,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    /// Attach to `pids` and spawn the sampling task
    ///
    /// Attachment happens before this returns, so callers that own the
    /// processes should call it before reaping any of them. Must be called
    /// from within a tokio runtime.
    pub fn start(&self, pids: &[u32]) -> MonitorHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut seen = HashSet::with_capacity(pids.len());
        let mut sampling = Vec::with_capacity(pids.len());

        for &pid in pids {
            if !seen.insert(pid) {
                continue;
            }
            let state = PidState::attach(pid, self.probe.as_ref());
            if state.is_sampling() {
                sampling.push(state);
            } else {
                let _ = sender.send(state.into_metrics());
            }
        }

        debug!(
            tracked = seen.len(),
            attached = sampling.len(),
            interval_ms = self.sample_interval.as_millis() as u64,
            "process monitor started"
        );

        let task = tokio::spawn(sampling_loop(sampling, self.sample_interval, sender));
        MonitorHandle {
            pids: seen.into_iter().collect(),
            receiver,
            task,
        }
    }

    /// Monitor `pids` until all of them exit
    pub async fn monitor(&self, pids: &[u32]) -> HashMap<u32, ProcessMetrics> {
        self.start(pids).wait().await
    }
}

/// Join side of a running monitor
pub struct MonitorHandle {
    pids: Vec<u32>,
    receiver: mpsc::UnboundedReceiver<ProcessMetrics>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Identifiers this monitor tracks, deduplicated
    pub fn pids(&self) -> &[u32] {
        &self.pids
    }

    /// Collect finalized metrics until the monitor finishes or `timeout` elapses
    ///
    /// On timeout the sampling task is aborted and identifiers that had not
    /// finished are absent from the map.
    pub async fn join(mut self, timeout: Duration) -> HashMap<u32, ProcessMetrics> {
        let mut collected = HashMap::with_capacity(self.pids.len());
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, self.receiver.recv()).await {
                Ok(Some(metrics)) => {
                    collected.insert(metrics.pid, metrics);
                }
                Ok(None) => break,
                Err(_) => {
                    self.task.abort();
                    while let Ok(metrics) = self.receiver.try_recv() {
                        collected.insert(metrics.pid, metrics);
                    }
                    let missing: Vec<u32> = self
                        .pids
                        .iter()
                        .copied()
                        .filter(|pid| !collected.contains_key(pid))
                        .collect();
                    warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        ?missing,
                        "monitor join timed out; metrics unavailable"
                    );
                    break;
                }
            }
        }

        collected
    }

    /// Collect metrics with no deadline
    pub async fn wait(mut self) -> HashMap<u32, ProcessMetrics> {
        let mut collected = HashMap::with_capacity(self.pids.len());
        while let Some(metrics) = self.receiver.recv().await {
            collected.insert(metrics.pid, metrics);
        }
        collected
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
