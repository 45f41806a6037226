//! procbench Library
//!
//! Runs a set of independent compute workers fully concurrently and then one
//! at a time, sampling each worker process's CPU and resident memory while it
//! runs, and compares the two runs.

pub mod artifacts;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod monitor;
pub mod orchestrator;
pub mod platform;
pub mod report;
pub mod supervisor;
pub mod utils;
pub mod workload;

// Re-export commonly used types for convenience
pub use config::BenchConfig;
pub use crate::core::models::*;
pub use error::{BenchError, BenchResult};
pub use monitor::{MonitorHandle, ProcessMonitor};
pub use orchestrator::{summarize, Orchestrator};
pub use report::{speedup, Report};
pub use supervisor::WorkloadLauncher;
