//! Human-readable comparison of the two execution modes

use crate::config::METRIC_PRECISION;
use crate::core::models::{RunOutcome, RunSummary};
use crate::orchestrator::summarize;
use crate::utils::round_to;
use std::fmt::Write as _;
use std::time::Duration;

/// Serial over concurrent wall time, 0.0 when the concurrent time is not positive
pub fn speedup(serial_wall_time_sec: f64, concurrent_wall_time_sec: f64) -> f64 {
    if concurrent_wall_time_sec > 0.0 {
        round_to(serial_wall_time_sec / concurrent_wall_time_sec, METRIC_PRECISION)
    } else {
        0.0
    }
}

/// `<os> <arch>` of the running host
pub fn platform_description() -> String {
    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub host_pid: u32,
    pub platform: String,
    pub sample_interval: Duration,
    pub concurrent_wall_time_sec: f64,
    pub serial_wall_time_sec: f64,
    pub speedup: f64,
    pub concurrent: RunSummary,
    pub serial: RunSummary,
}

impl Report {
    pub fn new(concurrent: &RunOutcome, serial: &RunOutcome, sample_interval: Duration) -> Self {
        Self {
            host_pid: std::process::id(),
            platform: platform_description(),
            sample_interval,
            concurrent_wall_time_sec: concurrent.total_wall_time_sec,
            serial_wall_time_sec: serial.total_wall_time_sec,
            speedup: speedup(serial.total_wall_time_sec, concurrent.total_wall_time_sec),
            concurrent: summarize(&concurrent.results),
            serial: summarize(&serial.results),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== ORCHESTRATION PROJECT REPORT ===");
        let _ = writeln!(out, "Host Parent PID: {}", self.host_pid);
        let _ = writeln!(out, "Platform: {}", self.platform);
        let _ = writeln!(
            out,
            "Sample interval: {:?} sec",
            self.sample_interval.as_secs_f64()
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "---- TIMING ----");
        let _ = writeln!(
            out,
            "Parallel total wall time  : {:?} sec",
            self.concurrent_wall_time_sec
        );
        let _ = writeln!(
            out,
            "Sequential total wall time: {:?} sec",
            self.serial_wall_time_sec
        );
        let _ = writeln!(out, "Speedup (seq/par)         : {:?}x", self.speedup);
        let _ = writeln!(out);
        render_summary(&mut out, "PARALLEL", &self.concurrent);
        let _ = writeln!(out);
        render_summary(&mut out, "SEQUENTIAL", &self.serial);
        let _ = writeln!(out);
        let _ = writeln!(out, "Notes:");
        let _ = writeln!(
            out,
            "- CPU% is relative to one core; values above 100 mean multiple cores were busy."
        );
        let _ = writeln!(
            out,
            "- Peak RSS is per process; parallel runs raise total RAM usage."
        );
        let _ = write!(out, "- Sample interval affects metric precision.");
        out
    }
}

fn render_summary(out: &mut String, title: &str, summary: &RunSummary) {
    let _ = writeln!(out, "---- {} METRICS (across workers) ----", title);
    for (key, value) in summary.key_values() {
        let _ = writeln!(out, "{}: {}", key, value);
    }
}
