/*!
 * Wait and Reap
 * Collect terminated children and report their exit status
 *
 * Every successful reap consumes exactly one unit of the termination
 * counter, matching the single post made by the child's termination
 * callback. An interrupted wait consumes nothing and leaves the child
 * reapable.
 */

use super::context::ProcessContext;
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::{ExitCode, Pid};
use crate::signals::WaitOutcome;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

bitflags! {
    /// Options accepted by `waitpid` and `wait4`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WaitOptions: u32 {
        /// Return immediately if no child has terminated.
        const WNOHANG = 1;
        /// Also report stopped children. Accepted, never reported.
        const WUNTRACED = 2;
        /// Also report continued children. Accepted, never reported.
        const WCONTINUED = 8;
    }
}

/// Which children a wait applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    /// Any tracked child
    Any,
    /// The child with this pid
    Pid(Pid),
}

impl WaitTarget {
    /// Parse the raw pid argument; group-based targets are not supported
    pub fn from_raw(pid: Pid) -> ProcessResult<Self> {
        match pid {
            -1 => Ok(WaitTarget::Any),
            p if p > 0 => Ok(WaitTarget::Pid(p)),
            p => Err(ProcessError::invalid_argument(format!(
                "wait target {} not supported",
                p
            ))),
        }
    }
}

/// Encoded wait status as seen by the emulated binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitStatus(i32);

impl WaitStatus {
    /// `W_EXITCODE(code, 0)`
    #[inline]
    pub fn exited(code: ExitCode) -> Self {
        Self(((code & 0xff) << 8) as i32)
    }

    #[inline]
    pub fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn is_exited(self) -> bool {
        self.0 & 0x7f == 0
    }

    #[inline]
    pub fn exit_code(self) -> ExitCode {
        ((self.0 >> 8) & 0xff) as ExitCode
    }
}

/// A child collected by a successful wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaped {
    pub pid: Pid,
    pub status: WaitStatus,
}

impl ProcessContext {
    /// Wait for a child to terminate and reap it
    pub fn wait(
        &mut self,
        target: WaitTarget,
        options: WaitOptions,
        want_rusage: bool,
    ) -> ProcessResult<Reaped> {
        if options.intersects(WaitOptions::WUNTRACED | WaitOptions::WCONTINUED) {
            warn!(pid = self.pid, ?options, "stop/continue reporting not supported, ignoring");
        }
        let unknown = options.bits() & !WaitOptions::all().bits();
        if unknown != 0 {
            warn!(pid = self.pid, bits = unknown, "unknown wait options ignored");
        }
        if want_rusage {
            warn!(pid = self.pid, "resource usage not collected");
        }

        let nohang = options.contains(WaitOptions::WNOHANG);
        let position = match target {
            WaitTarget::Pid(pid) => self.select_pid(pid, nohang)?,
            WaitTarget::Any => self.select_any(nohang)?,
        };
        self.finalize(position)
    }

    fn select_pid(&mut self, pid: Pid, nohang: bool) -> ProcessResult<usize> {
        let position = self
            .children
            .position(pid)
            .ok_or_else(|| ProcessError::no_such_child(format!("{} is not a child", pid)))?;
        let record = self
            .children
            .get(position)
            .ok_or_else(|| ProcessError::internal("tracked child vanished"))?;

        if !record.is_terminated() {
            if nohang {
                return Err(ProcessError::no_such_child(format!("{} still running", pid)));
            }
            debug!(parent = self.pid, pid, "blocking on child");
            match self.signals.wait_child(&record.watch(), None) {
                WaitOutcome::Ready(()) => {}
                WaitOutcome::Interrupted => return Err(ProcessError::Interrupted),
                WaitOutcome::TimedOut => {
                    return Err(ProcessError::internal("untimed wait timed out"))
                }
            }
        }

        self.signals.consume_termination();
        Ok(position)
    }

    fn select_any(&mut self, nohang: bool) -> ProcessResult<usize> {
        if self.children.is_empty() {
            return Err(ProcessError::no_such_child("no children"));
        }

        if nohang {
            let position = self
                .children
                .first_terminated()
                .ok_or_else(|| ProcessError::no_such_child("no child has terminated"))?;
            self.signals.consume_termination();
            return Ok(position);
        }

        debug!(parent = self.pid, children = self.children.len(), "blocking on any child");
        match self.signals.wait_termination(None) {
            WaitOutcome::Ready(()) => {}
            WaitOutcome::Interrupted => return Err(ProcessError::Interrupted),
            WaitOutcome::TimedOut => return Err(ProcessError::internal("untimed wait timed out")),
        }

        self.children
            .first_terminated()
            .ok_or_else(|| ProcessError::no_such_child("termination posted without a child"))
    }

    fn finalize(&mut self, position: usize) -> ProcessResult<Reaped> {
        let record = self.children.take(position)?;
        let pid = record.pid();
        let code = record.native().exit_code().ok_or_else(|| {
            ProcessError::internal(format!("no exit code for terminated child {}", pid))
        })?;
        drop(record);

        self.table.lock()?.release(pid)?;

        let status = WaitStatus::exited(code);
        info!(parent = self.pid, pid, code, "child reaped");
        Ok(Reaped { pid, status })
    }
}
