#![cfg(unix)]

use procbench::monitor::ProcessMonitor;
use serial_test::serial;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const INTERVAL: Duration = Duration::from_millis(50);
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
#[serial]
async fn monitor_samples_until_child_exits() {
    let mut child = Command::new("sleep")
        .arg("0.6")
        .stdout(Stdio::null())
        .spawn()
        .expect("spawn sleep");
    let pid = child.id().expect("pid");

    let handle = ProcessMonitor::new(INTERVAL).start(&[pid]);
    let status = child.wait().await.expect("wait sleep");
    assert!(status.success());

    let metrics = handle.join(JOIN_TIMEOUT).await;
    let recorded = metrics.get(&pid).expect("metrics for sleep");

    assert_eq!(recorded.pid, pid);
    assert!(!recorded.alive);
    assert!(recorded.samples >= 3, "samples {}", recorded.samples);
    assert!(recorded.rss_peak_mb > 0.0);
    assert!(recorded.cpu_peak >= recorded.cpu_avg);
    assert!(recorded.end_ts >= recorded.start_ts);
    assert!(recorded.duration_sec_monitored >= 0.4);
    assert!(recorded.error.is_none());
}

#[tokio::test]
#[serial]
async fn busy_child_shows_cpu_usage() {
    let mut child = Command::new("yes")
        .stdout(Stdio::null())
        .spawn()
        .expect("spawn yes");
    let pid = child.id().expect("pid");

    let handle = ProcessMonitor::new(Duration::from_millis(100)).start(&[pid]);
    tokio::time::sleep(Duration::from_millis(700)).await;
    child.kill().await.expect("kill yes");

    let metrics = handle.join(JOIN_TIMEOUT).await;
    let recorded = &metrics[&pid];
    assert!(recorded.samples > 0);
    assert!(recorded.cpu_peak > 5.0, "cpu_peak {}", recorded.cpu_peak);
    assert!(recorded.cpu_avg > 0.0);
}

#[tokio::test]
async fn invalid_pid_is_recorded_as_unreachable() {
    // above any configurable pid_max
    let pid = u32::MAX - 1;
    let metrics = ProcessMonitor::new(INTERVAL).monitor(&[pid]).await;
    let recorded = &metrics[&pid];

    assert!(!recorded.alive);
    assert_eq!(recorded.samples, 0);
    assert_eq!(recorded.cpu_avg, 0.0);
    assert_eq!(recorded.rss_peak_mb, 0.0);
    assert_eq!(recorded.end_ts, recorded.start_ts);
    assert_eq!(recorded.duration_sec_monitored, 0.0);
    assert!(recorded.error.is_some());
}

#[tokio::test]
#[serial]
async fn fast_exit_before_first_round_has_zero_samples() {
    let mut child = Command::new("true").spawn().expect("spawn true");
    let pid = child.id().expect("pid");

    // first poll happens one interval after start
    let handle = ProcessMonitor::new(Duration::from_millis(300)).start(&[pid]);
    child.wait().await.expect("wait true");

    let metrics = handle.join(JOIN_TIMEOUT).await;
    let recorded = &metrics[&pid];
    assert_eq!(recorded.samples, 0);
    assert_eq!(recorded.cpu_avg, 0.0);
    assert_eq!(recorded.rss_peak_mb, 0.0);
    assert!(!recorded.alive);
}
