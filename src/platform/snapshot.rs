//! Refresh-based process access
//!
//! APIs like sysinfo compute CPU usage over the time between two refreshes, so
//! a polling round must refresh exactly once. The liveness check does that
//! refresh and the readings of the same round come from it.

use crate::monitor::probe::{ProbeError, TrackedProcess};

/// Values read by one refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Percentage of one core since the previous refresh
    pub cpu_percent: f64,
    pub rss_bytes: u64,
}

pub trait SnapshotSource: Send {
    /// Refresh the process; `None` once it is gone
    fn refresh(&mut self) -> Option<Snapshot>;
}

pub struct RefreshedProcess<S> {
    pid: u32,
    source: S,
    last: Option<Snapshot>,
}

impl<S: SnapshotSource> RefreshedProcess<S> {
    /// The attach refresh becomes the CPU baseline
    pub fn attach(pid: u32, mut source: S) -> Result<Self, ProbeError> {
        let last = source.refresh().ok_or(ProbeError::NoSuchProcess(pid))?;
        Ok(Self {
            pid,
            source,
            last: Some(last),
        })
    }

    fn last(&self) -> Result<Snapshot, ProbeError> {
        self.last.ok_or(ProbeError::NoSuchProcess(self.pid))
    }
}

impl<S: SnapshotSource> TrackedProcess for RefreshedProcess<S> {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_running(&mut self) -> bool {
        self.last = self.source.refresh();
        self.last.is_some()
    }

    fn cpu_percent(&mut self) -> Result<f64, ProbeError> {
        self.last().map(|snapshot| snapshot.cpu_percent)
    }

    fn rss_bytes(&mut self) -> Result<u64, ProbeError> {
        self.last().map(|snapshot| snapshot.rss_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Each refresh returns the next scripted CPU value and counts itself
    struct CountingSource {
        refreshes: Arc<AtomicUsize>,
        cpu: Vec<f64>,
    }

    impl SnapshotSource for CountingSource {
        fn refresh(&mut self) -> Option<Snapshot> {
            let index = self.refreshes.fetch_add(1, Ordering::SeqCst);
            self.cpu.get(index).map(|&cpu_percent| Snapshot {
                cpu_percent,
                rss_bytes: 1024,
            })
        }
    }

    #[test]
    fn test_one_refresh_per_round() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            refreshes: Arc::clone(&refreshes),
            cpu: vec![0.0, 25.0, 75.0],
        };

        let mut process = RefreshedProcess::attach(5, source).unwrap();
        // baseline reading taken right after attach
        assert_eq!(process.cpu_percent().unwrap(), 0.0);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        let mut readings = Vec::new();
        while process.is_running() {
            readings.push(process.cpu_percent().unwrap());
            assert_eq!(process.rss_bytes().unwrap(), 1024);
        }

        assert_eq!(readings, vec![25.0, 75.0]);
        // attach, two sampling rounds, and the round that saw the exit
        assert_eq!(refreshes.load(Ordering::SeqCst), 4);
        assert_eq!(process.cpu_percent(), Err(ProbeError::NoSuchProcess(5)));
    }

    #[test]
    fn test_attach_to_gone_process_fails() {
        let source = CountingSource {
            refreshes: Arc::new(AtomicUsize::new(0)),
            cpu: Vec::new(),
        };
        assert!(RefreshedProcess::attach(6, source).is_err());
    }
}
