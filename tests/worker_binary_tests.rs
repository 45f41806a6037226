#![cfg(unix)]

use procbench::commands::run_comparison;
use procbench::config::{
    BenchConfig, WorkerSettings, CONCURRENT_RESULTS_FILE, REPORT_FILE, SERIAL_RESULTS_FILE,
};
use procbench::core::models::{WorkerSuccess, WorkloadConfig};
use procbench::supervisor::WorkloadLauncher;
use serial_test::serial;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const WORKER: &str = env!("CARGO_BIN_EXE_procbench-worker");

fn small_config(seed: u64) -> WorkloadConfig {
    WorkloadConfig::new(seed, 0.1, 100, 200, 5)
}

#[test]
fn worker_prints_one_result_line() {
    let argument = small_config(9).to_argument().unwrap();
    let output = Command::new(WORKER).arg(argument).output().expect("run worker");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);

    let record: WorkerSuccess = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(record.seed, 9);
    assert_eq!(record.epoch_count, 100);
    assert_eq!(record.sample_count, 200);
    assert!(record.accuracy > 0.5);
    assert!(record.pid > 0);
}

#[test]
fn worker_rejects_missing_and_bad_arguments() {
    let missing = Command::new(WORKER).output().expect("run worker");
    assert_eq!(missing.status.code(), Some(1));
    assert!(!missing.stderr.is_empty());

    let bad = Command::new(WORKER).arg("{not json").output().expect("run worker");
    assert_eq!(bad.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&bad.stderr).contains("Bad JSON config"));
}

#[tokio::test]
#[serial]
async fn full_comparison_writes_three_artifacts() {
    let output_dir = TempDir::new().unwrap();
    let config = BenchConfig {
        sample_interval_ms: 20,
        monitor_join_timeout_secs: 5,
        worker: WorkerSettings::default(),
        workloads: (1..=3).map(small_config).collect(),
    };

    let run = run_comparison(&config, WorkloadLauncher::new(WORKER), output_dir.path(), false)
        .await
        .expect("comparison run");

    assert_eq!(run.artifacts.len(), 3);
    for name in [CONCURRENT_RESULTS_FILE, SERIAL_RESULTS_FILE, REPORT_FILE] {
        assert!(output_dir.path().join(name).is_file(), "{name} missing");
    }

    let parallel: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.path().join(CONCURRENT_RESULTS_FILE)).unwrap(),
    )
    .unwrap();
    let entries = parallel.as_array().expect("results array");
    assert_eq!(entries.len(), 3);
    for (entry, seed) in entries.iter().zip(1..) {
        assert_eq!(entry["seed"], seed);
        assert!(entry["accuracy"].is_number());
        assert!(entry.get("wall_time_one_sec").is_none());
        assert_eq!(entry["os_metrics"]["pid"], entry["pid"]);
    }

    let sequential: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.path().join(SERIAL_RESULTS_FILE)).unwrap(),
    )
    .unwrap();
    assert!(sequential[0]["wall_time_one_sec"].is_number());

    let report = fs::read_to_string(output_dir.path().join(REPORT_FILE)).unwrap();
    assert!(report.starts_with("=== ORCHESTRATION PROJECT REPORT ==="));
    assert!(report.contains(&format!("Speedup (seq/par)         : {:?}x", run.report.speedup)));
    assert!(report.contains("workers: 3"));
    assert_eq!(run.report.concurrent.worker_count, 3);
    assert_eq!(run.report.serial.worker_count, 3);
}
