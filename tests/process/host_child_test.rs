/*!
 * Host Child Tests
 * Real host processes tracked and reaped through the wait engine
 */

use posix_procs::core::limits::SIGNALED_EXIT_BASE;
use posix_procs::{
    HostChild, LocalSignalHost, NativeChild, ProcessContext, ProcessTable, WaitOptions,
    WaitStatus, WaitTarget,
};
use pretty_assertions::assert_eq;
use std::process::Command;
use std::sync::Arc;

fn join(table: &ProcessTable) -> ProcessContext {
    ProcessContext::init(table.clone(), Arc::new(LocalSignalHost::new()), 9000).unwrap()
}

#[test]
fn test_host_exit_code_reaped() {
    let table = ProcessTable::in_memory();
    let mut ctx = join(&table);
    let native = HostChild::spawn(Command::new("sh").args(["-c", "exit 3"])).unwrap();
    let pid = ctx.track_child(native.clone()).unwrap();

    let reaped = ctx
        .wait(WaitTarget::Pid(pid), WaitOptions::empty(), false)
        .unwrap();
    assert_eq!(reaped.pid, pid);
    assert_eq!(reaped.status, WaitStatus::exited(3));
    assert_eq!(native.exit_code(), Some(3));
    assert!(!table.lock().unwrap().exists(pid));
}

#[test]
fn test_killed_host_child_reports_signal() {
    let table = ProcessTable::in_memory();
    let mut ctx = join(&table);
    let mut sleeper = Command::new("sleep").arg("30").spawn().unwrap();
    sleeper.kill().unwrap();
    let native = HostChild::watch(sleeper).unwrap();
    let pid = ctx.track_child(native).unwrap();

    let reaped = ctx
        .wait(WaitTarget::Any, WaitOptions::empty(), false)
        .unwrap();
    assert_eq!(reaped.pid, pid);
    assert_eq!(reaped.status.exit_code(), SIGNALED_EXIT_BASE + 9);
}
