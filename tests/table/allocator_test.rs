/*!
 * Allocator Tests
 * Pid uniqueness, bootstrap, round-robin order and the capacity ceiling
 */

use posix_procs::core::limits::{INIT_PID, MAX_PROCESS_COUNT};
use posix_procs::{LocalSignalHost, Pid, ProcessContext, ProcessError, ProcessTable, SimulatedChild};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn join(table: &ProcessTable) -> ProcessContext {
    ProcessContext::init(table.clone(), Arc::new(LocalSignalHost::new()), 1000).unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Allocate,
    Release(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Allocate),
        1 => any::<usize>().prop_map(Op::Release),
    ]
}

proptest! {
    #[test]
    fn live_pids_are_unique(ops in prop::collection::vec(op(), 1..300)) {
        let table = ProcessTable::in_memory();
        let mut guard = table.lock().unwrap();
        let mut live: Vec<Pid> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate => {
                    let pid = guard.allocate().unwrap();
                    prop_assert!(pid > 0 && (pid as usize) < MAX_PROCESS_COUNT);
                    prop_assert!(!live.contains(&pid));
                    live.push(pid);
                }
                Op::Release(i) if !live.is_empty() => {
                    let pid = live.swap_remove(i % live.len());
                    guard.release(pid).unwrap();
                }
                Op::Release(_) => {}
            }
        }

        prop_assert_eq!(guard.count_running(), live.len());
        let distinct: HashSet<Pid> = live.iter().copied().collect();
        prop_assert_eq!(distinct.len(), live.len());
    }
}

#[test]
fn test_first_process_creates_root() {
    let table = ProcessTable::in_memory();
    let first = join(&table);
    let second = join(&table);

    assert_eq!(first.pid(), 2);
    assert_eq!(second.pid(), 3);

    let root = table.lock().unwrap().read(INIT_PID).unwrap();
    assert!(root.is_running());
    assert_eq!((root.ppid, root.pgid, root.sid, root.native_id), (0, 1, 1, 0));
    assert_eq!(root.signal_channel, None);
}

#[test]
fn test_released_pid_not_reused_immediately() {
    let table = ProcessTable::in_memory();
    let mut guard = table.lock().unwrap();
    let a = guard.allocate().unwrap();
    let b = guard.allocate().unwrap();
    let c = guard.allocate().unwrap();
    assert_eq!((a, b, c), (1, 2, 3));

    guard.release(b).unwrap();
    assert_eq!(guard.allocate().unwrap(), 4);
    assert_eq!(guard.last_allocated(), 4);
}

#[test]
fn test_scan_wraps_to_low_pids() {
    let table = ProcessTable::in_memory();
    let mut guard = table.lock().unwrap();
    for _ in 1..MAX_PROCESS_COUNT {
        guard.allocate().unwrap();
    }
    guard.release(5).unwrap();
    guard.release(9).unwrap();
    assert_eq!(guard.allocate().unwrap(), 5);
    assert_eq!(guard.allocate().unwrap(), 9);
}

#[test]
fn test_full_table_is_typed_error() {
    let table = ProcessTable::in_memory();
    let mut parent = join(&table);
    {
        let mut guard = table.lock().unwrap();
        while guard.count_running() < MAX_PROCESS_COUNT - 1 {
            guard.allocate().unwrap();
        }
        let err = guard.allocate().unwrap_err();
        assert!(matches!(err, ProcessError::ResourceExhausted(_)));
        assert!(err.is_fatal());
    }

    let err = parent.track_child(SimulatedChild::new(1001)).unwrap_err();
    assert!(matches!(err, ProcessError::ResourceExhausted(_)));
    assert!(parent.children().is_empty());
}

#[test]
fn test_snapshot_and_live_count_agree() {
    let table = ProcessTable::in_memory();
    let _a = join(&table);
    let _b = join(&table);

    let snapshot = table.snapshot().unwrap();
    let pids: Vec<Pid> = snapshot.iter().map(|(pid, _)| *pid).collect();
    assert_eq!(pids, vec![1, 2, 3]);
    assert_eq!(table.live_count().unwrap(), 3);
}
