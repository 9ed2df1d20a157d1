/*!
 * System Syscalls
 * uname, sysinfo, resource limits and assorted stubs
 *
 * These report fixed values good enough for common runtimes to start up.
 * Unsupported requests either fail with a Linux errno or are logged and
 * reported as successful, whichever keeps callers running.
 */

use super::executor::SyscallExecutor;
use super::types::{resource, OldUtsname, Rlimit, SyscallReturn, Sysinfo, Utsname};
use crate::core::limits::{
    FAKE_NPROC_LIMIT, MAX_FD_COUNT, OLDOLD_UTS_FIELD, PAGE_SIZE, ROBUST_LIST_HEAD_SIZE,
    STACK_SIZE, UTS_DOMAINNAME, UTS_NODENAME, UTS_RELEASE, UTS_SYSNAME,
};
use crate::core::types::Pid;
use nix::errno::Errno;
use tracing::{error, info, warn};

/// Machine string for the compiled target
fn machine() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "i686",
        arch => arch,
    }
}

fn utsname() -> Utsname {
    Utsname {
        sysname: UTS_SYSNAME.to_string(),
        nodename: UTS_NODENAME.to_string(),
        release: UTS_RELEASE.to_string(),
        version: UTS_RELEASE.to_string(),
        machine: machine().to_string(),
        domainname: UTS_DOMAINNAME.to_string(),
    }
}

/// Host memory in `PAGE_SIZE` units: (total ram, free ram, total swap, free swap)
#[cfg(any(target_os = "linux", target_os = "android"))]
fn host_memory() -> (u64, u64, u64, u64) {
    let page = u64::from(PAGE_SIZE);
    match nix::sys::sysinfo::sysinfo() {
        Ok(host) => (
            host.ram_total() / page,
            host.ram_unused() / page,
            host.swap_total() / page,
            host.swap_free() / page,
        ),
        Err(e) => {
            warn!(errno = %e, "host sysinfo unavailable, reporting no memory");
            (0, 0, 0, 0)
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn host_memory() -> (u64, u64, u64, u64) {
    (0, 0, 0, 0)
}

impl SyscallExecutor {
    pub fn uname(&self, buf: Option<&mut Utsname>) -> SyscallReturn {
        let _span = self.span("uname");
        let buf = buf.ok_or(Errno::EFAULT)?;
        *buf = utsname();
        Ok(0)
    }

    pub fn olduname(&self, buf: Option<&mut OldUtsname>) -> SyscallReturn {
        let _span = self.span("olduname");
        let buf = buf.ok_or(Errno::EFAULT)?;
        *buf = OldUtsname::from_utsname(utsname(), None);
        Ok(0)
    }

    /// `uname` with every field cut to the pre-1.0 nine byte layout
    pub fn oldolduname(&self, buf: Option<&mut OldUtsname>) -> SyscallReturn {
        let _span = self.span("oldolduname");
        let buf = buf.ok_or(Errno::EFAULT)?;
        *buf = OldUtsname::from_utsname(utsname(), Some(OLDOLD_UTS_FIELD));
        Ok(0)
    }

    pub fn sysinfo(&self, info: Option<&mut Sysinfo>) -> SyscallReturn {
        let span = self.span("sysinfo");
        let info = info.ok_or(Errno::EFAULT)?;
        let table = self.context.table();
        let procs = Self::finish(&span, table.live_count())?;
        let (totalram, freeram, totalswap, freeswap) = host_memory();
        *info = Sysinfo {
            uptime: table.uptime().as_secs() as i64,
            totalram,
            freeram,
            totalswap,
            freeswap,
            procs: u16::try_from(procs).unwrap_or(u16::MAX),
            mem_unit: PAGE_SIZE,
            ..Sysinfo::default()
        };
        Ok(0)
    }

    pub fn getrlimit(&self, resource: i32, rlim: Option<&mut Rlimit>) -> SyscallReturn {
        let _span = self.span("getrlimit");
        info!(resource, "getrlimit");
        let rlim = rlim.ok_or(Errno::EFAULT)?;
        *rlim = match resource {
            resource::RLIMIT_STACK => Rlimit::fixed(STACK_SIZE),
            resource::RLIMIT_NPROC => {
                info!("RLIMIT_NPROC: reporting fixed limit");
                Rlimit::fixed(FAKE_NPROC_LIMIT)
            }
            resource::RLIMIT_NOFILE => Rlimit::fixed(MAX_FD_COUNT),
            other => {
                error!(resource = other, "unsupported resource");
                return Err(Errno::EINVAL);
            }
        };
        Ok(0)
    }

    pub fn setrlimit(&self, resource: i32, rlim: Option<&Rlimit>) -> SyscallReturn {
        let _span = self.span("setrlimit");
        rlim.ok_or(Errno::EFAULT)?;
        error!(resource, "unsupported resource");
        Err(Errno::EINVAL)
    }

    pub fn getrusage(&self, who: i32) -> SyscallReturn {
        let _span = self.span("getrusage");
        error!(who, "unhandled getrusage target");
        Err(Errno::EINVAL)
    }

    pub fn getpriority(&self, which: i32, who: i32) -> SyscallReturn {
        let _span = self.span("getpriority");
        warn!(which, who, "getpriority not implemented, reporting 0");
        Ok(0)
    }

    pub fn setpriority(&self, which: i32, who: i32, prio: i32) -> SyscallReturn {
        let _span = self.span("setpriority");
        warn!(which, who, prio, "setpriority not implemented, ignoring");
        Ok(0)
    }

    pub fn prctl(&self, option: i32) -> SyscallReturn {
        let _span = self.span("prctl");
        warn!(option, "prctl not implemented");
        Ok(0)
    }

    pub fn capget(&self) -> SyscallReturn {
        let _span = self.span("capget");
        warn!("capget not implemented");
        Ok(0)
    }

    pub fn capset(&self) -> SyscallReturn {
        let _span = self.span("capset");
        warn!("capset not implemented");
        Ok(0)
    }

    pub fn prlimit64(&self, pid: Pid, resource: i32) -> SyscallReturn {
        let _span = self.span("prlimit64");
        warn!(pid, resource, "prlimit64 not implemented");
        Ok(0)
    }

    /// Everything runs on CPU 0, node 0
    pub fn getcpu(&self, cpu: Option<&mut u32>, node: Option<&mut u32>) -> SyscallReturn {
        let _span = self.span("getcpu");
        if let Some(cpu) = cpu {
            *cpu = 0;
        }
        if let Some(node) = node {
            *node = 0;
        }
        Ok(0)
    }

    /// Report a single CPU so callers do not spin up worker threads
    ///
    /// Clears `cpusetsize` rounded up to a multiple of 8 bytes and sets bit 0.
    pub fn sched_getaffinity(&self, pid: Pid, cpusetsize: usize, mask: &mut [u8]) -> SyscallReturn {
        let _span = self.span("sched_getaffinity");
        info!(pid, cpusetsize, "sched_getaffinity");
        if pid != 0 {
            error!(pid, "affinity of other processes not supported");
            return Err(Errno::ESRCH);
        }
        let bytes = cpusetsize.checked_add(7).ok_or(Errno::EINVAL)? & !7;
        let mask = mask.get_mut(..bytes).ok_or(Errno::EFAULT)?;
        mask.fill(0);
        if let Some(first) = mask.first_mut() {
            *first = 1;
        }
        Ok(std::mem::size_of::<usize>() as i64)
    }

    pub fn set_tid_address(&self) -> SyscallReturn {
        let _span = self.span("set_tid_address");
        warn!("clear_child_tid not supported");
        Ok(i64::from(self.context.tid()))
    }

    pub fn futex(&self, op: i32) -> SyscallReturn {
        let _span = self.span("futex");
        error!(op, "unsupported futex operation");
        Err(Errno::ENOSYS)
    }

    pub fn set_robust_list(&self, len: usize) -> SyscallReturn {
        let _span = self.span("set_robust_list");
        if len != ROBUST_LIST_HEAD_SIZE {
            warn!(len, expected = ROBUST_LIST_HEAD_SIZE, "robust list head size mismatch");
        }
        warn!("set_robust_list not supported");
        Ok(0)
    }
}
