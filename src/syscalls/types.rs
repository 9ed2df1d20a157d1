/*!
 * Syscall Types
 * Return convention and the structures filled in by stub syscalls
 */

use crate::core::errors::ProcessError;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};

/// Raw syscall outcome: a non-negative return value or an errno
pub type SyscallReturn = Result<i64, Errno>;

/// Linux convention: errors come back as the negated errno
#[inline]
pub fn into_raw(ret: SyscallReturn) -> i64 {
    match ret {
        Ok(value) => value,
        Err(errno) => -(errno as i64),
    }
}

impl From<ProcessError> for Errno {
    fn from(err: ProcessError) -> Self {
        err.errno()
    }
}

/// `struct utsname`, as owned strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utsname {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub domainname: String,
}

/// `struct old_utsname` and `struct oldold_utsname`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OldUtsname {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub version: String,
    pub machine: String,
}

impl OldUtsname {
    /// Copy of `uts` without the domain name, each field cut to `limit` bytes
    pub(super) fn from_utsname(uts: Utsname, limit: Option<usize>) -> Self {
        let cut = |mut field: String| {
            if let Some(limit) = limit {
                while field.len() > limit {
                    field.pop();
                }
            }
            field
        };
        Self {
            sysname: cut(uts.sysname),
            nodename: cut(uts.nodename),
            release: cut(uts.release),
            version: cut(uts.version),
            machine: cut(uts.machine),
        }
    }
}

/// `struct rlimit`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rlimit {
    pub cur: u64,
    pub max: u64,
}

impl Rlimit {
    #[inline]
    pub const fn fixed(value: u64) -> Self {
        Self {
            cur: value,
            max: value,
        }
    }
}

/// `struct sysinfo`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sysinfo {
    /// Seconds since the table handle was opened
    pub uptime: i64,
    pub loads: [u64; 3],
    pub totalram: u64,
    pub freeram: u64,
    pub sharedram: u64,
    pub bufferram: u64,
    pub totalswap: u64,
    pub freeswap: u64,
    /// Live identities in the process table
    pub procs: u16,
    pub totalhigh: u64,
    pub freehigh: u64,
    pub mem_unit: u32,
}

/// Resource numbers accepted by `getrlimit`
pub mod resource {
    pub const RLIMIT_STACK: i32 = 3;
    pub const RLIMIT_NPROC: i32 = 6;
    pub const RLIMIT_NOFILE: i32 = 7;
}
