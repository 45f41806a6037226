//! Worker process launching and output collection
//!
//! A worker receives its configuration as one JSON argument, prints one JSON
//! record on stdout and exits. Anything else (nonzero exit, unparseable
//! output, broken pipes) becomes a failure record for that worker only.

use crate::config::{OUTPUT_TAIL_CHARS, TIME_PRECISION, WORKER_BIN_ENV, WORKER_BIN_NAME};
use crate::config::WorkerSettings;
use crate::core::models::{WorkerFailure, WorkerResult, WorkerSuccess, WorkloadConfig};
use crate::error::{BenchError, BenchResult};
use crate::platform;
use crate::utils::{env, round_to, tail_chars};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Find the worker executable
///
/// Order: explicit path, config file, `PROCBENCH_WORKER_BIN`, a sibling of the
/// running executable, then `PATH`.
pub fn resolve_worker_program(
    explicit: Option<&Path>,
    settings: &WorkerSettings,
) -> BenchResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &settings.path {
        return Ok(path.clone());
    }
    if let Some(path) = env::non_empty_var(WORKER_BIN_ENV) {
        return Ok(PathBuf::from(path));
    }

    let file_name = format!("{}{}", WORKER_BIN_NAME, std::env::consts::EXE_SUFFIX);
    if let Ok(current) = std::env::current_exe() {
        let sibling = current.with_file_name(&file_name);
        if sibling.is_file() {
            return Ok(sibling);
        }
    }

    which::which(WORKER_BIN_NAME).map_err(|_| {
        BenchError::config(format!(
            "'{}' not found next to the executable or in PATH; pass --worker or set {}",
            WORKER_BIN_NAME, WORKER_BIN_ENV
        ))
    })
}

/// Builds and spawns worker processes
#[derive(Debug, Clone)]
pub struct WorkloadLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkloadLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the config JSON argument
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_settings(explicit: Option<&Path>, settings: &WorkerSettings) -> BenchResult<Self> {
        let program = resolve_worker_program(explicit, settings)?;
        Ok(Self::new(program).with_args(settings.args.iter().cloned()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Start one worker without waiting for it
    pub fn spawn(&self, config: &WorkloadConfig) -> BenchResult<RunningWorker> {
        let argument = config.to_argument()?;

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.arg(argument);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        // spawned siblings die with a run that fails part-way through launching
        command.kill_on_drop(true);
        platform::prepare_command(&mut command);

        let launch_error = |source: io::Error| BenchError::Launch {
            program: self.program.display().to_string(),
            source,
        };

        let started = Instant::now();
        let child = command.spawn().map_err(launch_error)?;
        let pid = child
            .id()
            .ok_or_else(|| launch_error(io::Error::other("worker exited before its pid was read")))?;

        debug!(pid, seed = config.seed, program = %self.program.display(), "worker spawned");

        Ok(RunningWorker {
            pid,
            config: config.clone(),
            child,
            started,
        })
    }
}

/// A spawned worker whose output has not been collected yet
#[derive(Debug)]
pub struct RunningWorker {
    pid: u32,
    config: WorkloadConfig,
    child: Child,
    started: Instant,
}

/// A worker after exit, with its interpreted record
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedWorker {
    pub pid: u32,
    pub result: WorkerResult,
    /// Spawn to exit, as seen by the orchestrator
    pub elapsed: Duration,
}

impl CompletedWorker {
    pub fn elapsed_secs(&self) -> f64 {
        round_to(self.elapsed.as_secs_f64(), TIME_PRECISION)
    }
}

impl RunningWorker {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Read stdout and stderr to end-of-stream and wait for the exit status
    ///
    /// No timeout: a worker that never exits blocks here.
    pub async fn collect(mut self) -> CompletedWorker {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();

        let (stdout, stderr, status) = tokio::join!(
            capture_stream(stdout),
            capture_stream(stderr),
            self.child.wait()
        );
        let elapsed = self.started.elapsed();

        let result = match (status, stdout, stderr) {
            (Ok(status), Ok(stdout), Ok(stderr)) => interpret_output(
                self.pid,
                self.config.seed,
                status,
                &String::from_utf8_lossy(&stdout),
                &String::from_utf8_lossy(&stderr),
            ),
            (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
                warn!(pid = self.pid, error = %err, "failed to collect worker output");
                WorkerResult::Failure(WorkerFailure {
                    pid: self.pid,
                    seed: self.config.seed,
                    error: format!("failed to collect worker output: {}", err),
                    exit_code: None,
                    raw_out_tail: None,
                    raw_err_tail: None,
                })
            }
        };

        CompletedWorker {
            pid: self.pid,
            result,
            elapsed,
        }
    }
}

async fn capture_stream<R>(reader: Option<R>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut captured).await?;
    }
    Ok(captured)
}

/// Turn a finished worker's exit status and output into its record
pub fn interpret_output(
    pid: u32,
    seed: u64,
    status: ExitStatus,
    stdout: &str,
    stderr: &str,
) -> WorkerResult {
    if !status.success() {
        let message = stderr.trim();
        warn!(pid, seed, code = ?status.code(), "worker exited with failure");
        return WorkerResult::Failure(WorkerFailure {
            pid,
            seed,
            error: if message.is_empty() {
                "worker failed".to_string()
            } else {
                message.to_string()
            },
            exit_code: status.code(),
            raw_out_tail: None,
            raw_err_tail: None,
        });
    }

    match serde_json::from_str::<WorkerSuccess>(stdout.trim()) {
        Ok(record) => {
            if record.seed != seed {
                warn!(pid, expected = seed, reported = record.seed, "worker reported a different seed");
            }
            WorkerResult::Success(record)
        }
        Err(err) => {
            warn!(pid, seed, error = %err, "worker output is not a result record");
            WorkerResult::Failure(WorkerFailure {
                pid,
                seed,
                error: "Invalid JSON from worker".to_string(),
                exit_code: status.code(),
                raw_out_tail: Some(tail_chars(stdout, OUTPUT_TAIL_CHARS)),
                raw_err_tail: Some(tail_chars(stderr, OUTPUT_TAIL_CHARS)),
            })
        }
    }
}
