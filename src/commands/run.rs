//! One comparison: a concurrent run, a serial run, then the result files and
//! the report

use crate::artifacts::ArtifactWriter;
use crate::config::BenchConfig;
use crate::core::models::RunOutcome;
use crate::error::BenchResult;
use crate::orchestrator::Orchestrator;
use crate::report::Report;
use crate::supervisor::WorkloadLauncher;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything one comparison produced
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub concurrent: RunOutcome,
    pub serial: RunOutcome,
    pub report: Report,
    /// Artifact paths in write order: concurrent results, serial results, report
    pub artifacts: Vec<PathBuf>,
}

/// Run the configured workloads concurrently, then serially, and write the artifacts
///
/// Each mode's results file is written as soon as that mode finishes.
pub async fn run_comparison(
    config: &BenchConfig,
    launcher: WorkloadLauncher,
    output_dir: &Path,
    progress: bool,
) -> BenchResult<ComparisonRun> {
    let sample_interval = config.sample_interval();
    let writer = ArtifactWriter::new(output_dir);
    let orchestrator = Orchestrator::new(launcher)
        .with_join_timeout(config.monitor_join_timeout())
        .with_progress(progress);

    info!(
        worker = %orchestrator.launcher().program().display(),
        workloads = config.workloads.len(),
        sample_interval_ms = config.sample_interval_ms,
        "starting comparison"
    );

    let mut artifacts = Vec::with_capacity(3);

    let concurrent = orchestrator
        .run_concurrent(&config.workloads, sample_interval)
        .await?;
    artifacts.push(writer.write_results(concurrent.mode, &concurrent.results)?);

    let serial = orchestrator
        .run_serial(&config.workloads, sample_interval)
        .await?;
    artifacts.push(writer.write_results(serial.mode, &serial.results)?);

    let report = Report::new(&concurrent, &serial, sample_interval);
    artifacts.push(writer.write_report(&report)?);

    info!(speedup = report.speedup, "comparison finished");

    Ok(ComparisonRun {
        concurrent,
        serial,
        report,
        artifacts,
    })
}
