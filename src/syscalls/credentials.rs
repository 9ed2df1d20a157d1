/*!
 * Credential Syscalls
 * Every process runs as root; changes are accepted and ignored
 */

use super::executor::SyscallExecutor;
use super::types::SyscallReturn;
use nix::errno::Errno;
use tracing::{info, warn};

/// Identity reported for every user and group query
const ROOT_ID: u32 = 0;

/// Real, effective and saved ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResIds {
    pub real: u32,
    pub effective: u32,
    pub saved: u32,
}

impl ResIds {
    const ROOT: Self = Self {
        real: ROOT_ID,
        effective: ROOT_ID,
        saved: ROOT_ID,
    };
}

impl SyscallExecutor {
    pub fn getuid(&self) -> SyscallReturn {
        let _span = self.span("getuid");
        Ok(i64::from(ROOT_ID))
    }

    pub fn geteuid(&self) -> SyscallReturn {
        let _span = self.span("geteuid");
        Ok(i64::from(ROOT_ID))
    }

    pub fn getgid(&self) -> SyscallReturn {
        let _span = self.span("getgid");
        Ok(i64::from(ROOT_ID))
    }

    pub fn getegid(&self) -> SyscallReturn {
        let _span = self.span("getegid");
        Ok(i64::from(ROOT_ID))
    }

    pub fn setuid(&self, uid: u32) -> SyscallReturn {
        let _span = self.span("setuid");
        info!(uid, "setuid ignored");
        Ok(0)
    }

    pub fn setgid(&self, gid: u32) -> SyscallReturn {
        let _span = self.span("setgid");
        info!(gid, "setgid ignored");
        Ok(0)
    }

    pub fn setresuid(&self, ruid: u32, euid: u32, suid: u32) -> SyscallReturn {
        let _span = self.span("setresuid");
        info!(ruid, euid, suid, "setresuid ignored");
        Ok(0)
    }

    pub fn setresgid(&self, rgid: u32, egid: u32, sgid: u32) -> SyscallReturn {
        let _span = self.span("setresgid");
        info!(rgid, egid, sgid, "setresgid ignored");
        Ok(0)
    }

    pub fn getresuid(&self, out: Option<&mut ResIds>) -> SyscallReturn {
        let _span = self.span("getresuid");
        if let Some(out) = out {
            *out = ResIds::ROOT;
        }
        Ok(0)
    }

    pub fn getresgid(&self, out: Option<&mut ResIds>) -> SyscallReturn {
        let _span = self.span("getresgid");
        if let Some(out) = out {
            *out = ResIds::ROOT;
        }
        Ok(0)
    }

    /// No supplementary groups
    pub fn getgroups(&self, size: i32, _list: &mut [u32]) -> SyscallReturn {
        let _span = self.span("getgroups");
        if size < 0 {
            warn!(size, "getgroups with negative size");
            return Err(Errno::EINVAL);
        }
        Ok(0)
    }
}
