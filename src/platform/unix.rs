use crate::monitor::probe::{ProbeError, ProcessProbe, TrackedProcess};
use psutil::process::{Process, ProcessError, Status};
#[cfg(target_os = "linux")]
use std::io;

/// Prepare the worker command so the worker does not outlive the orchestrator
pub fn prepare_command(cmd: &mut tokio::process::Command) {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: the hook only issues an async-signal-safe prctl call
        unsafe {
            cmd.pre_exec(|| {
                if set_parent_death_signal() != 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = cmd;
    }
}

/// Safely set parent death signal
///
/// Encapsulates unsafe prctl call
#[cfg(target_os = "linux")]
unsafe fn set_parent_death_signal() -> libc::c_int {
    unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) }
}

fn probe_error(pid: u32, err: ProcessError) -> ProbeError {
    match err {
        ProcessError::NoSuchProcess { .. } | ProcessError::ZombieProcess { .. } => {
            ProbeError::NoSuchProcess(pid)
        }
        ProcessError::AccessDenied { .. } => ProbeError::AccessDenied(pid),
        other => ProbeError::Other {
            pid,
            message: other.to_string(),
        },
    }
}

/// psutil-backed probe for Linux and macOS
#[derive(Debug, Clone, Copy, Default)]
pub struct PsutilProbe;

impl ProcessProbe for PsutilProbe {
    fn attach(&self, pid: u32) -> Result<Box<dyn TrackedProcess>, ProbeError> {
        let process = Process::new(pid).map_err(|err| probe_error(pid, err))?;
        Ok(Box::new(PsutilProcess { pid, process }))
    }
}

struct PsutilProcess {
    pid: u32,
    process: Process,
}

impl TrackedProcess for PsutilProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_running(&mut self) -> bool {
        // psutil compares creation time, so a recycled pid reads as not running
        if !self.process.is_running() {
            return false;
        }
        // an exited child stays visible as a zombie until it is reaped
        !matches!(self.process.status(), Ok(Status::Zombie) | Err(_))
    }

    fn cpu_percent(&mut self) -> Result<f64, ProbeError> {
        self.process
            .cpu_percent()
            .map(f64::from)
            .map_err(|err| probe_error(self.pid, err))
    }

    fn rss_bytes(&mut self) -> Result<u64, ProbeError> {
        self.process
            .memory_info()
            .map(|info| info.rss())
            .map_err(|err| probe_error(self.pid, err))
    }
}
