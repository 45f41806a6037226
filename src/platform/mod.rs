//! Platform-specific process handling

#[cfg(any(windows, test))]
mod snapshot;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{prepare_command, PsutilProbe as NativeProbe};
#[cfg(windows)]
pub use windows::{prepare_command, SysinfoProbe as NativeProbe};
