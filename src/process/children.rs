/*!
 * Child Tracker
 * Fixed-capacity registry of a parent's unreaped native children
 *
 * Arena with an explicit free-index stack: records never move, the index
 * of a record is stable while it is active, and the active list keeps
 * insertion order so "reap any" picks deterministically.
 */

use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::Pid;
use crate::signals::{ChildWatch, NativeChild, TerminationFlag};
use std::fmt;
use std::sync::Arc;

/// Bookkeeping for one spawned child
pub struct ChildRecord {
    pid: Pid,
    native: Arc<dyn NativeChild>,
    terminated: TerminationFlag,
}

impl ChildRecord {
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn native(&self) -> &Arc<dyn NativeChild> {
        &self.native
    }

    /// Set by the signal subsystem's termination callback, never by the tracker
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.terminated.is_set()
    }

    /// View handed to the signal subsystem
    pub fn watch(&self) -> ChildWatch {
        ChildWatch {
            pid: self.pid,
            native: Arc::clone(&self.native),
            terminated: self.terminated.clone(),
        }
    }
}

impl fmt::Debug for ChildRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRecord")
            .field("pid", &self.pid)
            .field("native_id", &self.native.native_id())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

/// Per-parent pool of child records
pub struct ChildTracker {
    records: Vec<Option<ChildRecord>>,
    /// Free record indices, next to hand out on top
    free: Vec<usize>,
    /// Active record indices in insertion order
    active: Vec<usize>,
}

impl ChildTracker {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: (0..capacity).map(|_| None).collect(),
            free: (0..capacity).rev().collect(),
            active: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of live or unreaped children
    #[inline]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    #[inline]
    pub fn has_capacity(&self) -> bool {
        !self.free.is_empty()
    }

    /// Move a record from the free list to the active list
    pub fn insert(&mut self, pid: Pid, native: Arc<dyn NativeChild>) -> ProcessResult<ChildWatch> {
        let index = self.free.pop().ok_or_else(|| {
            ProcessError::resource_exhausted(format!(
                "child limit of {} reached",
                self.records.len()
            ))
        })?;
        let record = ChildRecord {
            pid,
            native,
            terminated: TerminationFlag::new(),
        };
        let watch = record.watch();
        self.records[index] = Some(record);
        self.active.push(index);
        Ok(watch)
    }

    /// Position in the active list of the child with `pid`
    pub fn position(&self, pid: Pid) -> Option<usize> {
        self.iter().position(|record| record.pid == pid)
    }

    /// Position of the first terminated child in insertion order
    pub fn first_terminated(&self) -> Option<usize> {
        self.iter().position(ChildRecord::is_terminated)
    }

    /// Record at an active-list position
    pub fn get(&self, position: usize) -> Option<&ChildRecord> {
        self.active
            .get(position)
            .and_then(|&index| self.records[index].as_ref())
    }

    /// Remove the record at an active-list position, returning its slot to the free list
    pub fn take(&mut self, position: usize) -> ProcessResult<ChildRecord> {
        if position >= self.active.len() {
            return Err(ProcessError::internal(format!(
                "child position {} out of range",
                position
            )));
        }
        let index = self.active.remove(position);
        self.free.push(index);
        self.records[index]
            .take()
            .ok_or_else(|| ProcessError::internal("active child slot was empty"))
    }

    /// Remove every record, in insertion order
    pub fn drain(&mut self) -> Vec<ChildRecord> {
        let active = std::mem::take(&mut self.active);
        let mut out = Vec::with_capacity(active.len());
        for index in active {
            self.free.push(index);
            if let Some(record) = self.records[index].take() {
                out.push(record);
            }
        }
        out
    }

    /// Active records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ChildRecord> + '_ {
        self.active
            .iter()
            .filter_map(move |&index| self.records[index].as_ref())
    }
}
