/*!
 * Lifecycle Tests
 * Child tracking limits, fork attachment and shutdown reclamation
 */

use posix_procs::core::limits::{INIT_PID, MAX_CHILD_COUNT};
use posix_procs::{
    LocalSignalHost, ProcessContext, ProcessError, ProcessTable, SimulatedChild, WaitOptions,
    WaitTarget,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn join(table: &ProcessTable) -> ProcessContext {
    ProcessContext::init(table.clone(), Arc::new(LocalSignalHost::new()), 7000).unwrap()
}

#[test]
fn test_child_limit_checked_before_table() {
    let table = ProcessTable::in_memory();
    let mut parent = join(&table);
    for i in 0..MAX_CHILD_COUNT {
        parent.track_child(SimulatedChild::new(i as u32)).unwrap();
    }
    let before = table.live_count().unwrap();

    let err = parent.track_child(SimulatedChild::new(99_999)).unwrap_err();
    assert!(matches!(err, ProcessError::ResourceExhausted(_)));
    assert_eq!(table.live_count().unwrap(), before);
}

#[test]
fn test_forked_child_sees_its_parent() {
    let table = ProcessTable::in_memory();
    let mut parent = join(&table);
    let native = SimulatedChild::new(7001);
    let pid = parent.track_child(native.clone()).unwrap();

    let child = ProcessContext::after_fork(table.clone(), Arc::new(LocalSignalHost::new()), pid)
        .unwrap();
    assert_eq!(child.pid(), pid);
    assert_eq!(child.ppid().unwrap(), parent.pid());
    assert_eq!(child.pgrp().unwrap(), parent.pid());
    assert_eq!(child.sid().unwrap(), parent.pid());

    // Child exits while the parent is still around: its slot waits for the reap
    child.shutdown().unwrap();
    assert!(table.lock().unwrap().exists(pid));
    native.exit(0);
    parent.wait(WaitTarget::Pid(pid), WaitOptions::empty(), false).unwrap();
    assert!(!table.lock().unwrap().exists(pid));
}

#[test]
fn test_orphan_releases_own_slot() {
    let table = ProcessTable::in_memory();
    let ctx = join(&table);
    let pid = ctx.pid();

    ctx.shutdown().unwrap();
    assert!(!table.lock().unwrap().exists(pid));
    assert!(table.lock().unwrap().exists(INIT_PID));
}

#[test]
fn test_shutdown_reparents_and_releases_children() {
    let table = ProcessTable::in_memory();
    let mut parent = join(&table);
    let parent_pid = parent.pid();

    let finished = SimulatedChild::new(7010);
    let running = SimulatedChild::new(7011);
    let finished_pid = parent.track_child(finished.clone()).unwrap();
    let running_pid = parent.track_child(running.clone()).unwrap();
    finished.exit(0);

    parent.shutdown().unwrap();

    let guard = table.lock().unwrap();
    assert!(!guard.exists(parent_pid));
    assert!(!guard.exists(finished_pid));
    let orphan = guard.read(running_pid).unwrap();
    assert!(orphan.is_running());
    assert_eq!(orphan.ppid, INIT_PID);
    drop(guard);

    // The orphan now releases itself on exit
    let orphan_ctx =
        ProcessContext::after_fork(table.clone(), Arc::new(LocalSignalHost::new()), running_pid)
            .unwrap();
    orphan_ctx.shutdown().unwrap();
    assert!(!table.lock().unwrap().exists(running_pid));
    running.exit(0);
}

#[test]
fn test_child_shutdown_before_parent_shutdown_frees_slot() {
    let table = ProcessTable::in_memory();
    let mut parent = join(&table);
    let native = SimulatedChild::new(7020);
    let pid = parent.track_child(native.clone()).unwrap();
    let child = ProcessContext::after_fork(table.clone(), Arc::new(LocalSignalHost::new()), pid)
        .unwrap();
    let before = table.live_count().unwrap();

    child.shutdown().unwrap();
    assert!(table.lock().unwrap().exists(pid));

    // Parent leaves before the native exit of the child is observed
    parent.shutdown().unwrap();
    native.exit(0);

    assert!(!table.lock().unwrap().exists(pid));
    assert_eq!(table.live_count().unwrap(), before - 2);
}
