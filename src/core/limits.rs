/*!
 * System Limits and Constants
 *
 * Centralized location for capacities, well-known identities and the
 * fixed values reported by stub syscalls.
 *
 * - Capacity values are compile-time design parameters of the shared table
 * - Linux-compatible values are marked with [LINUX-COMPAT]
 */

use crate::core::types::Pid;

// =============================================================================
// PROCESS TABLE
// =============================================================================

/// Number of slots in the shared process table
/// Slot 0 is never issued, so at most `MAX_PROCESS_COUNT - 1` identities live at once
pub const MAX_PROCESS_COUNT: usize = 4096;

/// Identity of the synthetic root process
pub const INIT_PID: Pid = 1;

/// Maximum number of unreaped children tracked by one emulated process
pub const MAX_CHILD_COUNT: usize = 1024;

// =============================================================================
// HOST BACKING
// =============================================================================

/// Default backing file for the shared table
/// Lives on tmpfs so the mapping never hits a disk
pub const DEFAULT_TABLE_PATH: &str = "/dev/shm/posix-procs.table";

/// Default lock file guarding the shared table
pub const DEFAULT_LOCK_PATH: &str = "/dev/shm/posix-procs.lock";

/// Exit code offset used when a native child was killed by a host signal
/// [LINUX-COMPAT] Matches the shell convention 128 + signal number
pub const SIGNALED_EXIT_BASE: u32 = 128;

// =============================================================================
// STUB SYSCALL VALUES
// =============================================================================

/// Stack size reported for RLIMIT_STACK (1MB)
pub const STACK_SIZE: u64 = 1024 * 1024;

/// Open file limit reported for RLIMIT_NOFILE
pub const MAX_FD_COUNT: u64 = 1024;

/// Fake process count limit reported for RLIMIT_NPROC
pub const FAKE_NPROC_LIMIT: u64 = 65536;

/// Page size used for memory unit reporting
/// [LINUX-COMPAT] x86 / x86_64 page size
pub const PAGE_SIZE: u32 = 4096;

/// `uname` sysname
pub const UTS_SYSNAME: &str = "Linux";

/// `uname` nodename
pub const UTS_NODENAME: &str = "PosixProcs";

/// `uname` release and version
/// [LINUX-COMPAT] Old enough that glibc does not probe newer syscalls
pub const UTS_RELEASE: &str = "3.15.0";

/// `uname` domainname
pub const UTS_DOMAINNAME: &str = "GNU/Linux";

/// Field size of `struct oldold_utsname`, terminator included
/// [LINUX-COMPAT] `__OLD_UTS_LEN + 1`
pub const OLDOLD_UTS_FIELD: usize = 9;

/// Size of `struct robust_list_head` on the current target
pub const ROBUST_LIST_HEAD_SIZE: usize = 3 * std::mem::size_of::<usize>();
