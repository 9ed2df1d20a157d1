/*!
 * Mapped Table Tests
 * Two handles over one backing file see the same identities
 */

use posix_procs::table::{FileLock, MappedStorage};
use posix_procs::{LocalSignalHost, ProcessContext, ProcessTable};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn open(dir: &TempDir) -> ProcessTable {
    let storage = MappedStorage::open(dir.path().join("procs.table")).unwrap();
    let lock = FileLock::open(dir.path().join("procs.lock")).unwrap();
    ProcessTable::new(Arc::new(storage), Arc::new(lock))
}

#[test]
fn test_handles_share_identities() {
    let dir = TempDir::new().unwrap();
    let first = open(&dir);
    let second = open(&dir);

    let a = ProcessContext::init(first.clone(), Arc::new(LocalSignalHost::new()), 10).unwrap();
    assert_eq!(a.pid(), 2);

    let seen = second.lock().unwrap().read(a.pid()).unwrap();
    assert!(seen.is_running());
    assert_eq!(seen.native_id, 10);

    let b = ProcessContext::init(second.clone(), Arc::new(LocalSignalHost::new()), 11).unwrap();
    assert_eq!(b.pid(), 3);
    assert_eq!(first.live_count().unwrap(), 3);
}

#[test]
fn test_table_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let pid = {
        let table = open(&dir);
        let ctx = ProcessContext::init(table, Arc::new(LocalSignalHost::new()), 12).unwrap();
        ctx.pid()
    };

    let reopened = open(&dir);
    assert!(reopened.lock().unwrap().exists(pid));
    assert_eq!(reopened.lock().unwrap().last_allocated(), pid);
}

#[test]
fn test_oversized_backing_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("procs.table");
    let file = std::fs::File::create(&path).unwrap();
    file.set_len(64 * 1024 * 1024).unwrap();

    assert!(MappedStorage::open(&path).is_err());
}
