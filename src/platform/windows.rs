use super::snapshot::{RefreshedProcess, Snapshot, SnapshotSource};
use crate::monitor::probe::{ProbeError, ProcessProbe, TrackedProcess};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Workers on Windows need no extra preparation
pub fn prepare_command(_cmd: &mut tokio::process::Command) {}

/// sysinfo-backed probe for Windows
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoProbe;

impl ProcessProbe for SysinfoProbe {
    fn attach(&self, pid: u32) -> Result<Box<dyn TrackedProcess>, ProbeError> {
        let source = SysinfoSource {
            sys_pid: Pid::from_u32(pid),
            system: System::new(),
        };
        Ok(Box::new(RefreshedProcess::attach(pid, source)?))
    }
}

struct SysinfoSource {
    sys_pid: Pid,
    system: System,
}

impl SnapshotSource for SysinfoSource {
    /// CPU usage covers the time since the previous refresh
    fn refresh(&mut self) -> Option<Snapshot> {
        let pid_list = [self.sys_pid];
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&pid_list),
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );
        self.system.process(self.sys_pid).map(|process| Snapshot {
            cpu_percent: f64::from(process.cpu_usage()),
            rss_bytes: process.memory(),
        })
    }
}
