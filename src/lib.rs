/*!
 * POSIX Process Identity Library
 * Emulated pids, process groups, sessions and child reaping over a shared table
 */

pub mod config;
pub mod core;
pub mod monitoring;
pub mod process;
pub mod procfs;
pub mod signals;
pub mod syscalls;
pub mod table;

// Re-exports
pub use config::{ConfigError, EmulationConfig, TableBackend};
pub use crate::core::{InlineString, Pid, ProcessError, ProcessResult};
pub use monitoring::init_tracing;
pub use process::{ProcessContext, Reaped, WaitOptions, WaitStatus, WaitTarget};
pub use procfs::ProcPidDirectory;
pub use signals::{HostChild, LocalSignalHost, NativeChild, SignalHost, SimulatedChild};
pub use syscalls::{into_raw, SyscallExecutor, SyscallReturn};
pub use table::{ProcessRecord, ProcessTable};
