/*!
 * Stub Syscall Tests
 * Fixed values reported by credential and system queries
 */

use nix::errno::Errno;
use posix_procs::core::limits::{FAKE_NPROC_LIMIT, MAX_FD_COUNT, PAGE_SIZE, STACK_SIZE};
use posix_procs::syscalls::{resource, OldUtsname, ResIds, Rlimit, Sysinfo, Utsname};
use posix_procs::{LocalSignalHost, ProcessContext, ProcessTable, SyscallExecutor};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn executor() -> SyscallExecutor {
    let table = ProcessTable::in_memory();
    let ctx = ProcessContext::init(table, Arc::new(LocalSignalHost::new()), 9000).unwrap();
    SyscallExecutor::new(ctx)
}

#[test]
fn test_everyone_is_root() {
    let exec = executor();
    assert_eq!(exec.getuid(), Ok(0));
    assert_eq!(exec.geteuid(), Ok(0));
    assert_eq!(exec.getgid(), Ok(0));
    assert_eq!(exec.getegid(), Ok(0));
    assert_eq!(exec.setuid(1000), Ok(0));
    assert_eq!(exec.getuid(), Ok(0));

    let mut ids = ResIds {
        real: 1,
        effective: 2,
        saved: 3,
    };
    assert_eq!(exec.getresuid(Some(&mut ids)), Ok(0));
    assert_eq!((ids.real, ids.effective, ids.saved), (0, 0, 0));
    assert_eq!(exec.getgroups(0, &mut []), Ok(0));
    assert_eq!(exec.getgroups(-1, &mut []), Err(Errno::EINVAL));
}

#[test]
fn test_uname() {
    let exec = executor();
    let mut buf = Utsname {
        sysname: String::new(),
        nodename: String::new(),
        release: String::new(),
        version: String::new(),
        machine: String::new(),
        domainname: String::new(),
    };
    assert_eq!(exec.uname(Some(&mut buf)), Ok(0));
    assert_eq!(buf.sysname, "Linux");
    assert_eq!(buf.release, "3.15.0");
    assert_eq!(buf.domainname, "GNU/Linux");
    assert!(!buf.machine.is_empty());
    assert_eq!(exec.uname(None), Err(Errno::EFAULT));
}

#[test]
fn test_sysinfo_counts_live_processes() {
    let exec = executor();
    let mut info = Sysinfo::default();
    assert_eq!(exec.sysinfo(Some(&mut info)), Ok(0));
    assert_eq!(info.procs, 2);
    assert_eq!(info.mem_unit, PAGE_SIZE);
}

#[cfg(target_os = "linux")]
#[test]
fn test_sysinfo_reports_host_memory() {
    let exec = executor();
    let mut info = Sysinfo::default();
    assert_eq!(exec.sysinfo(Some(&mut info)), Ok(0));
    assert!(info.totalram > 0);
    assert!(info.freeram <= info.totalram);
    assert!(info.freeswap <= info.totalswap);
}

#[test]
fn test_old_uname_layouts() {
    let exec = executor();
    let mut full = Utsname {
        sysname: String::new(),
        nodename: String::new(),
        release: String::new(),
        version: String::new(),
        machine: String::new(),
        domainname: String::new(),
    };
    exec.uname(Some(&mut full)).unwrap();

    let mut old = OldUtsname::default();
    assert_eq!(exec.olduname(Some(&mut old)), Ok(0));
    assert_eq!(old.sysname, full.sysname);
    assert_eq!(old.nodename, full.nodename);
    assert_eq!(old.machine, full.machine);

    let mut oldold = OldUtsname::default();
    assert_eq!(exec.oldolduname(Some(&mut oldold)), Ok(0));
    assert_eq!(oldold.sysname, "Linux");
    assert!(oldold.nodename.len() <= 9);
    assert!(full.nodename.starts_with(&oldold.nodename));

    assert_eq!(exec.olduname(None), Err(Errno::EFAULT));
    assert_eq!(exec.oldolduname(None), Err(Errno::EFAULT));
}

#[test]
fn test_resource_limits() {
    let exec = executor();
    let mut rlim = Rlimit::default();

    assert_eq!(exec.getrlimit(resource::RLIMIT_STACK, Some(&mut rlim)), Ok(0));
    assert_eq!(rlim, Rlimit::fixed(STACK_SIZE));
    assert_eq!(exec.getrlimit(resource::RLIMIT_NPROC, Some(&mut rlim)), Ok(0));
    assert_eq!(rlim.cur, FAKE_NPROC_LIMIT);
    assert_eq!(exec.getrlimit(resource::RLIMIT_NOFILE, Some(&mut rlim)), Ok(0));
    assert_eq!(rlim.max, MAX_FD_COUNT);

    assert_eq!(exec.getrlimit(0, Some(&mut rlim)), Err(Errno::EINVAL));
    assert_eq!(exec.setrlimit(resource::RLIMIT_STACK, Some(&rlim)), Err(Errno::EINVAL));
    assert_eq!(exec.getrusage(0), Err(Errno::EINVAL));
}

#[test]
fn test_scheduler_stubs() {
    let exec = executor();

    let mut mask = [0xffu8; 16];
    let word = std::mem::size_of::<usize>() as i64;
    assert_eq!(exec.sched_getaffinity(0, 4, &mut mask), Ok(word));
    assert_eq!(&mask[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(mask[8], 0xff);
    assert_eq!(exec.sched_getaffinity(5, 8, &mut mask), Err(Errno::ESRCH));
    assert_eq!(exec.sched_getaffinity(0, 32, &mut mask), Err(Errno::EFAULT));
    assert_eq!(exec.sched_getaffinity(0, usize::MAX, &mut mask), Err(Errno::EINVAL));

    let (mut cpu, mut node) = (9, 9);
    assert_eq!(exec.getcpu(Some(&mut cpu), Some(&mut node)), Ok(0));
    assert_eq!((cpu, node), (0, 0));
}

#[test]
fn test_misc_stubs() {
    let exec = executor();
    assert_eq!(exec.set_tid_address(), Ok(2));
    assert_eq!(exec.futex(0), Err(Errno::ENOSYS));
    assert_eq!(exec.set_robust_list(1), Ok(0));
    assert_eq!(exec.getpriority(0, 0), Ok(0));
    assert_eq!(exec.setpriority(0, 0, 5), Ok(0));
    assert_eq!(exec.prctl(15), Ok(0));
    assert_eq!(exec.capget(), Ok(0));
    assert_eq!(exec.capset(), Ok(0));
    assert_eq!(exec.prlimit64(0, 7), Ok(0));
}
