use crate::config::{METRIC_PRECISION, TIME_PRECISION};
use crate::core::models::{MergedResult, RunSummary};
use crate::utils::{max_or_zero, mean, round_to};

/// Reduce one run's merged results to averages and peaks
///
/// Failures count toward `worker_count` but contribute no compute time;
/// results without metrics contribute no resource figures. Empty input gives
/// an all-zero summary.
pub fn summarize(results: &[MergedResult]) -> RunSummary {
    let compute_times: Vec<f64> = results
        .iter()
        .filter_map(|merged| merged.result.train_time_sec())
        .collect();

    let mut rss_peaks = Vec::with_capacity(results.len());
    let mut cpu_avgs = Vec::with_capacity(results.len());
    let mut cpu_peaks = Vec::with_capacity(results.len());
    for metrics in results.iter().filter_map(|merged| merged.os_metrics.as_ref()) {
        rss_peaks.push(metrics.rss_peak_mb);
        cpu_avgs.push(metrics.cpu_avg);
        cpu_peaks.push(metrics.cpu_peak);
    }

    RunSummary {
        worker_count: results.len(),
        avg_compute_time: round_to(mean(&compute_times), TIME_PRECISION),
        max_rss_peak_mb: round_to(max_or_zero(&rss_peaks), METRIC_PRECISION),
        avg_rss_peak_mb: round_to(mean(&rss_peaks), METRIC_PRECISION),
        avg_cpu_avg: round_to(mean(&cpu_avgs), METRIC_PRECISION),
        max_cpu_peak: round_to(max_or_zero(&cpu_peaks), METRIC_PRECISION),
    }
}
