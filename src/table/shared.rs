/*!
 * Shared Process Table
 * Pid allocation and slot access under the cross-process lock
 */

use super::lock::{LocalLock, TableLock};
use super::slot::{ProcessRecord, SlotCell, SlotStatus};
use super::storage::{HeapStorage, TableRegion, TableStorage};
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::limits::{INIT_PID, MAX_PROCESS_COUNT};
use crate::core::types::Pid;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Handle to the process table shared by every emulated process
///
/// Cloning is cheap and yields another handle to the same storage and lock.
#[derive(Clone)]
pub struct ProcessTable {
    storage: Arc<dyn TableStorage>,
    lock: Arc<dyn TableLock>,
    opened_at: Instant,
}

impl ProcessTable {
    pub fn new(storage: Arc<dyn TableStorage>, lock: Arc<dyn TableLock>) -> Self {
        debug!(storage = %storage.describe(), lock = lock.name(), "process table handle opened");
        Self {
            storage,
            lock,
            opened_at: Instant::now(),
        }
    }

    /// Table living in this host process only, guarded by a local lock
    pub fn in_memory() -> Self {
        Self::new(Arc::new(HeapStorage::new()), Arc::new(LocalLock::default()))
    }

    /// Acquire the table lock
    pub fn lock(&self) -> ProcessResult<TableGuard<'_>> {
        self.lock.acquire()?;
        Ok(TableGuard { table: self })
    }

    /// Lock-free read of the caller's own slot
    ///
    /// Only the owner may skip the lock: nobody else writes an owned slot
    /// while its process is running.
    pub fn own_record(&self, pid: Pid) -> ProcessResult<ProcessRecord> {
        cell(self.region(), pid)
            .map(SlotCell::load)
            .ok_or(ProcessError::NoSuchProcess(pid))
    }

    /// Number of Running slots
    pub fn live_count(&self) -> ProcessResult<usize> {
        Ok(self.lock()?.count_running())
    }

    /// Locked copy of every Running slot in pid order
    pub fn snapshot(&self) -> ProcessResult<Vec<(Pid, ProcessRecord)>> {
        let guard = self.lock()?;
        let mut cursor = 1;
        let mut out = Vec::new();
        while let Some(pid) = guard.next_running(cursor) {
            if let Some(record) = guard.read(pid) {
                out.push((pid, record));
            }
            cursor = pid as usize + 1;
        }
        Ok(out)
    }

    /// Time since this handle was opened
    pub fn uptime(&self) -> Duration {
        self.opened_at.elapsed()
    }

    pub fn describe(&self) -> String {
        self.storage.describe()
    }

    #[inline]
    fn region(&self) -> &TableRegion {
        self.storage.region()
    }
}

#[inline]
fn cell(region: &TableRegion, pid: Pid) -> Option<&SlotCell> {
    usize::try_from(pid).ok().and_then(|idx| region.slots.get(idx))
}

/// Held table lock; every mutation goes through here
///
/// Dropping the guard releases the lock, so early returns cannot leak it.
pub struct TableGuard<'a> {
    table: &'a ProcessTable,
}

impl<'a> TableGuard<'a> {
    #[inline]
    fn region(&self) -> &TableRegion {
        self.table.region()
    }

    #[inline]
    fn cell_checked(&self, pid: Pid) -> ProcessResult<&SlotCell> {
        if pid == 0 {
            return Err(ProcessError::invalid_argument("slot 0 is reserved"));
        }
        cell(self.region(), pid).ok_or_else(|| {
            ProcessError::invalid_argument(format!("pid {} outside the process table", pid))
        })
    }

    /// Allocate a free slot with a round-robin scan
    ///
    /// Scans `MAX_PROCESS_COUNT - 1` candidates starting after the last
    /// allocated pid, wrapping to 1. The slot is marked Running and the
    /// caller fills in the rest of the record before releasing the lock.
    pub fn allocate(&mut self) -> ProcessResult<Pid> {
        let region = self.region();
        let max = MAX_PROCESS_COUNT as i64;
        let last = (region.last_allocated.load(Ordering::Acquire) as i64).clamp(0, max - 1);

        for i in 1..max {
            let mut cur = last + i;
            if cur >= max {
                cur -= max - 1;
            }
            let slot = &region.slots[cur as usize];
            if slot.status() == SlotStatus::NotExist {
                slot.set_status(SlotStatus::Running);
                region.last_allocated.store(cur as Pid, Ordering::Release);
                return Ok(cur as Pid);
            }
        }

        error!(capacity = MAX_PROCESS_COUNT, "process table full");
        Err(ProcessError::resource_exhausted("process table full"))
    }

    /// Allocate a pid for a process joining the table on its own
    ///
    /// If the scan lands on slot 1 the root identity does not exist yet;
    /// it is created first and a second allocation serves the caller.
    pub fn allocate_for_new_process(&mut self) -> ProcessResult<Pid> {
        let pid = self.allocate()?;
        if pid != INIT_PID {
            return Ok(pid);
        }
        self.region().slots[INIT_PID as usize].store(&ProcessRecord::root());
        info!("root identity created in slot {}", INIT_PID);
        self.allocate()
    }

    /// Mark a slot as free
    pub fn release(&mut self, pid: Pid) -> ProcessResult<()> {
        let cell = self.cell_checked(pid)?;
        cell.set_status(SlotStatus::NotExist);
        cell.set_exited(false);
        debug!(pid, "slot released");
        Ok(())
    }

    /// Whether `pid` names a Running slot
    pub fn exists(&self, pid: Pid) -> bool {
        cell(self.region(), pid).is_some_and(|slot| slot.status() == SlotStatus::Running)
    }

    /// Copy of a slot, `None` when `pid` is outside the table
    pub fn read(&self, pid: Pid) -> Option<ProcessRecord> {
        cell(self.region(), pid).map(SlotCell::load)
    }

    /// Overwrite a slot
    pub fn write(&mut self, pid: Pid, record: &ProcessRecord) -> ProcessResult<()> {
        self.cell_checked(pid)?.store(record);
        Ok(())
    }

    /// Read-modify-write a Running slot
    pub fn update(&mut self, pid: Pid, f: impl FnOnce(&mut ProcessRecord)) -> ProcessResult<()> {
        let cell = self.cell_checked(pid)?;
        let mut record = cell.load();
        if !record.is_running() {
            return Err(ProcessError::NoSuchProcess(pid));
        }
        f(&mut record);
        cell.store(&record);
        Ok(())
    }

    /// Last pid handed out by the allocator
    pub fn last_allocated(&self) -> Pid {
        self.region().last_allocated.load(Ordering::Acquire)
    }

    /// First Running pid at or after `from`, never slot 0
    pub fn next_running(&self, from: usize) -> Option<Pid> {
        let start = from.max(1);
        self.region()
            .slots
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, slot)| slot.status() == SlotStatus::Running)
            .map(|(idx, _)| idx as Pid)
    }

    pub fn count_running(&self) -> usize {
        self.region()
            .slots
            .iter()
            .skip(1)
            .filter(|slot| slot.status() == SlotStatus::Running)
            .count()
    }

    /// Whether some Running process has group `pgid`, optionally within session `sid`
    pub fn group_exists(&self, pgid: Pid, sid: Option<Pid>) -> bool {
        self.region().slots.iter().skip(1).any(|slot| {
            let record = slot.load();
            record.is_running() && record.pgid == pgid && sid.map_or(true, |s| record.sid == s)
        })
    }
}

impl Drop for TableGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.table.lock.release() {
            error!(lock = self.table.lock.name(), error = %e, "failed to release table lock");
        }
    }
}
