//! CLI argument parsing
//!
//! Defines the command line with clap and merges flags, environment overrides
//! and the config file into one run configuration

use crate::config::{BenchConfig, SAMPLE_INTERVAL_ENV};
use crate::error::BenchResult;
use crate::utils::env::duration_ms_from_env;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// procbench - concurrent vs serial runs with per-process CPU/RSS monitoring
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "procbench",
    about = "Compare concurrent and serial worker runs with per-process CPU and RSS monitoring",
    version
)]
pub struct Cli {
    /// TOML config file (the four built-in workloads when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the worker executable
    #[arg(long, value_name = "PATH")]
    pub worker: Option<PathBuf>,

    /// Sampling interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub sample_interval_ms: Option<u64>,

    /// Directory receiving the result files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Seconds to wait for the monitor once the workers are done
    #[arg(long, value_name = "SECS")]
    pub join_timeout_secs: Option<u64>,

    /// Log level or a full EnvFilter directive
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Extra log file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parse the process arguments; clap prints the error and exits on failure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse a custom argv
    pub fn try_parse_args_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }

    /// Merge configuration: flag > environment > config file > default
    pub fn resolve_config(&self) -> BenchResult<BenchConfig> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::load(path)?,
            None => BenchConfig::default(),
        };

        if let Some(ms) = self.sample_interval_ms {
            config.sample_interval_ms = ms;
        } else if let Some(interval) = duration_ms_from_env(SAMPLE_INTERVAL_ENV) {
            config.sample_interval_ms = interval.as_millis() as u64;
        }
        if let Some(secs) = self.join_timeout_secs {
            config.monitor_join_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_args_from(["procbench"]).unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(cli.config.is_none());
        assert!(cli.worker.is_none());
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_args_from([
            "procbench",
            "--worker",
            "/opt/worker",
            "--sample-interval-ms",
            "50",
            "--output-dir",
            "out",
            "--join-timeout-secs",
            "3",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.worker, Some(PathBuf::from("/opt/worker")));
        assert_eq!(cli.sample_interval_ms, Some(50));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert_eq!(cli.join_timeout_secs, Some(3));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_args_from(["procbench", "--parallel-only"]).is_err());
    }

    #[test]
    #[serial]
    fn test_flag_overrides_file_and_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_interval_ms = 300\nmonitor_join_timeout_secs = 4").unwrap();

        std::env::set_var(SAMPLE_INTERVAL_ENV, "120");
        let path = file.path().to_string_lossy().to_string();

        let from_env = Cli::try_parse_args_from(["procbench", "--config", path.as_str()])
            .unwrap()
            .resolve_config()
            .unwrap();
        assert_eq!(from_env.sample_interval_ms, 120);
        assert_eq!(from_env.monitor_join_timeout_secs, 4);

        let from_flag = Cli::try_parse_args_from([
            "procbench",
            "--config",
            path.as_str(),
            "--sample-interval-ms",
            "80",
            "--join-timeout-secs",
            "1",
        ])
        .unwrap()
        .resolve_config()
        .unwrap();
        assert_eq!(from_flag.sample_interval_ms, 80);
        assert_eq!(from_flag.monitor_join_timeout_secs, 1);

        std::env::remove_var(SAMPLE_INTERVAL_ENV);
    }

    #[test]
    #[serial]
    fn test_zero_interval_flag_rejected() {
        std::env::remove_var(SAMPLE_INTERVAL_ENV);
        let err = Cli::try_parse_args_from(["procbench", "--sample-interval-ms", "0"])
            .unwrap()
            .resolve_config()
            .unwrap_err();
        assert!(matches!(err, BenchError::Validation { .. }));
    }
}
