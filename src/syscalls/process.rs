/*!
 * Process Syscalls
 * waitpid, wait4, exit and exit_group
 */

use super::executor::SyscallExecutor;
use super::types::SyscallReturn;
use crate::core::types::Pid;
use crate::process::{WaitOptions, WaitTarget};
use tracing::{debug, error, info};

impl SyscallExecutor {
    pub fn waitpid(&mut self, pid: Pid, status: Option<&mut i32>, options: i32) -> SyscallReturn {
        self.wait_common("waitpid", pid, status, options, false)
    }

    pub fn wait4(
        &mut self,
        pid: Pid,
        status: Option<&mut i32>,
        options: i32,
        rusage_requested: bool,
    ) -> SyscallReturn {
        self.wait_common("wait4", pid, status, options, rusage_requested)
    }

    fn wait_common(
        &mut self,
        name: &'static str,
        pid: Pid,
        status: Option<&mut i32>,
        options: i32,
        rusage_requested: bool,
    ) -> SyscallReturn {
        let span = self.span(name);
        info!(pid, options, "{}", name);

        let result = WaitTarget::from_raw(pid).and_then(|target| {
            self.context.wait(
                target,
                WaitOptions::from_bits_retain(options as u32),
                rusage_requested,
            )
        });
        let reaped = Self::finish(&span, result)?;
        if let Some(out) = status {
            *out = reaped.status.raw();
        }
        Ok(i64::from(reaped.pid))
    }

    /// Give up the identity and terminate the host process
    pub fn exit(self, status: i32) -> ! {
        self.terminate("exit", status)
    }

    pub fn exit_group(self, status: i32) -> ! {
        self.terminate("exit_group", status)
    }

    fn terminate(self, name: &'static str, status: i32) -> ! {
        let pid = self.context.pid();
        info!(pid, status, "{}", name);
        if let Err(e) = self.context.shutdown() {
            error!(pid, error = %e, "shutdown failed, identity may leak");
        }
        debug!(pid, status, "host process exiting");
        std::process::exit(status)
    }
}
