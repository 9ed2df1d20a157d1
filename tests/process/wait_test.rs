/*!
 * Wait Tests
 * Reaping specific and arbitrary children, blocking and non-blocking
 */

use posix_procs::signals::SignalHost;
use posix_procs::{
    LocalSignalHost, ProcessContext, ProcessError, ProcessTable, SimulatedChild, WaitOptions,
    WaitStatus, WaitTarget,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct Fixture {
    table: ProcessTable,
    signals: LocalSignalHost,
    ctx: ProcessContext,
}

fn fixture() -> Fixture {
    let table = ProcessTable::in_memory();
    let signals = LocalSignalHost::new();
    let ctx = ProcessContext::init(table.clone(), Arc::new(signals.clone()), 4000).unwrap();
    Fixture {
        table,
        signals,
        ctx,
    }
}

fn spawn(fx: &mut Fixture, native_id: u32) -> (i32, Arc<SimulatedChild>) {
    let child = SimulatedChild::new(native_id);
    let pid = fx.ctx.track_child(child.clone()).unwrap();
    (pid, child)
}

#[test]
fn test_nohang_without_children() {
    let mut fx = fixture();
    let err = fx
        .ctx
        .wait(WaitTarget::Any, WaitOptions::WNOHANG, false)
        .unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(_)));
}

#[test]
fn test_blocking_any_without_children() {
    let mut fx = fixture();
    let err = fx.ctx.wait(WaitTarget::Any, WaitOptions::empty(), false).unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(_)));
}

#[test]
fn test_nohang_not_ready_then_ready() {
    let mut fx = fixture();
    let (pid, child) = spawn(&mut fx, 4001);

    let err = fx
        .ctx
        .wait(WaitTarget::Pid(pid), WaitOptions::WNOHANG, false)
        .unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(_)));
    let err = fx
        .ctx
        .wait(WaitTarget::Any, WaitOptions::WNOHANG, false)
        .unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(_)));

    child.exit(7);
    let reaped = fx
        .ctx
        .wait(WaitTarget::Pid(pid), WaitOptions::WNOHANG, false)
        .unwrap();
    assert_eq!(reaped.pid, pid);
    assert_eq!(reaped.status, WaitStatus::exited(7));
    assert_eq!(reaped.status.raw(), 7 << 8);
    assert_eq!(fx.signals.pending_terminations(), 0);
}

#[test]
fn test_wait_for_unknown_pid() {
    let mut fx = fixture();
    let (_pid, _child) = spawn(&mut fx, 4002);
    let err = fx
        .ctx
        .wait(WaitTarget::Pid(999), WaitOptions::empty(), false)
        .unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(_)));
    assert_eq!(fx.ctx.children().len(), 1);
}

#[test]
fn test_counter_balances_over_reaps() {
    let mut fx = fixture();
    let children: Vec<_> = (0..3).map(|i| spawn(&mut fx, 4010 + i)).collect();
    for (i, (_, child)) in children.iter().enumerate() {
        child.exit(i as u32);
    }
    assert_eq!(fx.signals.pending_terminations(), 3);

    let mut reaped: Vec<i32> = (0..3)
        .map(|_| fx.ctx.wait(WaitTarget::Any, WaitOptions::empty(), false).unwrap().pid)
        .collect();
    reaped.sort_unstable();
    let mut expected: Vec<i32> = children.iter().map(|(pid, _)| *pid).collect();
    expected.sort_unstable();
    assert_eq!(reaped, expected);
    assert_eq!(fx.signals.pending_terminations(), 0);

    let err = fx.ctx.wait(WaitTarget::Any, WaitOptions::empty(), false).unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(_)));
}

#[test]
fn test_any_reaps_in_insertion_order() {
    let mut fx = fixture();
    let (first, a) = spawn(&mut fx, 4020);
    let (second, b) = spawn(&mut fx, 4021);
    b.exit(2);
    a.exit(1);

    let reaped = fx.ctx.wait(WaitTarget::Any, WaitOptions::WNOHANG, false).unwrap();
    assert_eq!((reaped.pid, reaped.status.exit_code()), (first, 1));
    let reaped = fx.ctx.wait(WaitTarget::Any, WaitOptions::WNOHANG, false).unwrap();
    assert_eq!((reaped.pid, reaped.status.exit_code()), (second, 2));
}

#[test]
fn test_specific_wait_blocks_until_exit() {
    let mut fx = fixture();
    let (pid, child) = spawn(&mut fx, 4030);

    let exiter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        child.exit(3);
    });
    let reaped = fx
        .ctx
        .wait(WaitTarget::Pid(pid), WaitOptions::empty(), false)
        .unwrap();
    exiter.join().unwrap();

    assert_eq!(reaped.pid, pid);
    assert_eq!(reaped.status.exit_code(), 3);
    assert_eq!(fx.signals.pending_terminations(), 0);
}

#[test]
fn test_interrupted_wait_keeps_child() {
    let mut fx = fixture();
    let (pid, child) = spawn(&mut fx, 4040);

    fx.signals.deliver_signal(10);
    let err = fx
        .ctx
        .wait(WaitTarget::Pid(pid), WaitOptions::empty(), false)
        .unwrap_err();
    assert_eq!(err, ProcessError::Interrupted);
    let err = fx.ctx.wait(WaitTarget::Any, WaitOptions::empty(), false).unwrap_err();
    assert_eq!(err, ProcessError::Interrupted);
    assert_eq!(fx.signals.take_pending(), vec![10]);

    child.exit(0);
    let reaped = fx
        .ctx
        .wait(WaitTarget::Pid(pid), WaitOptions::empty(), false)
        .unwrap();
    assert_eq!(reaped.pid, pid);
    assert_eq!(fx.signals.pending_terminations(), 0);
}

#[test]
fn test_reap_frees_slot() {
    let mut fx = fixture();
    let (pid, child) = spawn(&mut fx, 4050);
    assert!(fx.table.lock().unwrap().exists(pid));

    child.exit(0);
    fx.ctx.wait(WaitTarget::Pid(pid), WaitOptions::empty(), false).unwrap();
    assert!(!fx.table.lock().unwrap().exists(pid));
    assert!(fx.ctx.children().is_empty());
}

#[test]
fn test_ignored_options_accepted() {
    let mut fx = fixture();
    let (pid, child) = spawn(&mut fx, 4060);
    child.exit(5);

    let options = WaitOptions::WUNTRACED | WaitOptions::WCONTINUED;
    let reaped = fx.ctx.wait(WaitTarget::Pid(pid), options, true).unwrap();
    assert_eq!(reaped.status.exit_code(), 5);
}
