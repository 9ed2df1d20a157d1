/*!
 * Proc Pid Directory
 * Enumerates live identities as numeric directory entries
 *
 * Iteration holds the table lock from `begin_iter` until `end_iter` (or
 * drop), so a listing is a consistent snapshot of the table.
 */

use crate::core::errors::ProcessResult;
use crate::core::types::Pid;
use crate::table::{ProcessTable, TableGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Directory,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileKind::File => write!(f, "file"),
            FileKind::Directory => write!(f, "directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: FileKind,
}

impl DirEntry {
    #[inline]
    pub fn directory(name: String) -> Self {
        Self {
            name,
            kind: FileKind::Directory,
        }
    }
}

/// One step of a cursor-driven listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterStep {
    Entry { entry: DirEntry, next: usize },
    End,
}

/// Directory whose listing needs setup and teardown
pub trait DirectoryIter {
    type Iteration<'a>: DirectoryCursor
    where
        Self: 'a;

    fn begin_iter(&self) -> ProcessResult<Self::Iteration<'_>>;
}

/// An open listing
pub trait DirectoryCursor {
    /// Entry at or after `cursor`, with the cursor to resume from
    fn next_entry(&self, cursor: usize) -> IterStep;

    fn end_iter(self)
    where
        Self: Sized,
    {
    }
}

/// `/proc`-style listing of every live pid
#[derive(Clone)]
pub struct ProcPidDirectory {
    table: ProcessTable,
}

impl ProcPidDirectory {
    pub fn new(table: ProcessTable) -> Self {
        Self { table }
    }

    /// Every live pid in ascending order
    pub fn list(&self) -> ProcessResult<Vec<Pid>> {
        let iteration = self.begin_iter()?;
        let mut pids = Vec::new();
        let mut cursor = 0;
        while let IterStep::Entry { entry, next } = iteration.next_entry(cursor) {
            if let Ok(pid) = entry.name.parse() {
                pids.push(pid);
            }
            cursor = next;
        }
        iteration.end_iter();
        Ok(pids)
    }
}

impl DirectoryIter for ProcPidDirectory {
    type Iteration<'a> = PidIteration<'a>;

    fn begin_iter(&self) -> ProcessResult<PidIteration<'_>> {
        Ok(PidIteration {
            guard: self.table.lock()?,
        })
    }
}

/// Listing in progress; owns the table lock
pub struct PidIteration<'a> {
    guard: TableGuard<'a>,
}

impl DirectoryCursor for PidIteration<'_> {
    fn next_entry(&self, cursor: usize) -> IterStep {
        match self.guard.next_running(cursor.max(1)) {
            Some(pid) => {
                trace!(pid, "listing pid");
                IterStep::Entry {
                    entry: DirEntry::directory(pid.to_string()),
                    next: pid as usize + 1,
                }
            }
            None => IterStep::End,
        }
    }

    fn end_iter(self) {
        drop(self.guard);
    }
}
