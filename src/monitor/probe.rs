//! OS process access used by the monitor
//!
//! Platform strategy:
//! - Linux/macOS: psutil
//! - Windows: sysinfo

use crate::platform;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Process not found: {0}")]
    NoSuchProcess(u32),
    #[error("Permission denied accessing process: {0}")]
    AccessDenied(u32),
    #[error("Failed to read process {pid}: {message}")]
    Other { pid: u32, message: String },
}

impl ProbeError {
    /// The process went away; an expected way for sampling to end
    pub fn is_gone(&self) -> bool {
        matches!(self, ProbeError::NoSuchProcess(_))
    }
}

/// A process the probe has attached to
pub trait TrackedProcess: Send {
    fn pid(&self) -> u32;

    /// False once the process has exited, become a zombie, or had its
    /// identifier reused by a different process
    fn is_running(&mut self) -> bool;

    /// CPU usage as a percentage of one core since the previous call
    /// (since attach on the first call)
    fn cpu_percent(&mut self) -> Result<f64, ProbeError>;

    /// Resident set size in bytes
    fn rss_bytes(&mut self) -> Result<u64, ProbeError>;
}

pub trait ProcessProbe: Send + Sync {
    fn attach(&self, pid: u32) -> Result<Box<dyn TrackedProcess>, ProbeError>;
}

/// Probe backed by the current platform's process API
pub fn default_probe() -> Arc<dyn ProcessProbe> {
    Arc::new(platform::NativeProbe)
}
