/*!
 * Identity Syscalls
 * Pid, parent, group and session queries
 */

use super::executor::SyscallExecutor;
use super::types::SyscallReturn;
use crate::core::types::Pid;
use tracing::info;

impl SyscallExecutor {
    pub fn getpid(&self) -> SyscallReturn {
        let _span = self.span("getpid");
        Ok(i64::from(self.context.pid()))
    }

    pub fn gettid(&self) -> SyscallReturn {
        let _span = self.span("gettid");
        Ok(i64::from(self.context.tid()))
    }

    pub fn getppid(&self) -> SyscallReturn {
        let span = self.span("getppid");
        Self::finish(&span, self.context.ppid()).map(i64::from)
    }

    pub fn getpgid(&self, pid: Pid) -> SyscallReturn {
        let span = self.span("getpgid");
        info!(pid, "getpgid");
        Self::finish(&span, self.context.pgid(pid)).map(i64::from)
    }

    pub fn getpgrp(&self) -> SyscallReturn {
        let span = self.span("getpgrp");
        Self::finish(&span, self.context.pgrp()).map(i64::from)
    }

    /// `getsid(pid)`, 0 meaning the caller
    pub fn getsid(&self, pid: Pid) -> SyscallReturn {
        let span = self.span("getsid");
        info!(pid, "getsid");
        Self::finish(&span, self.context.sid_of(pid)).map(i64::from)
    }

    pub fn setpgid(&self, pid: Pid, pgid: Pid) -> SyscallReturn {
        let span = self.span("setpgid");
        info!(pid, pgid, "setpgid");
        Self::finish(&span, self.context.set_pgid(pid, pgid)).map(|()| 0)
    }

    pub fn setsid(&self) -> SyscallReturn {
        let span = self.span("setsid");
        info!("setsid");
        Self::finish(&span, self.context.set_sid()).map(i64::from)
    }
}
