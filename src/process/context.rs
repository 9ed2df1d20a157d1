/*!
 * Process Context
 * Per-process state: own identity, shared table handle, children and signals
 */

use super::children::ChildTracker;
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::limits::{INIT_PID, MAX_CHILD_COUNT};
use crate::core::types::{NativeId, Pid};
use crate::signals::{NativeChild, SignalHost};
use crate::table::{ProcessRecord, ProcessTable, SlotStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything one emulated process knows about itself
///
/// Created once per native process, either by `init` when joining the
/// table on its own or by `after_fork` when a parent pre-filled the slot.
pub struct ProcessContext {
    pub(super) pid: Pid,
    pub(super) table: ProcessTable,
    pub(super) children: ChildTracker,
    pub(super) signals: Arc<dyn SignalHost>,
}

impl ProcessContext {
    /// Join the table as a fresh process
    ///
    /// The new identity is its own group and session leader, parented to
    /// the root. The first process to join also creates the root.
    pub fn init(
        table: ProcessTable,
        signals: Arc<dyn SignalHost>,
        native_id: NativeId,
    ) -> ProcessResult<Self> {
        let pid = {
            let mut guard = table.lock()?;
            let pid = guard.allocate_for_new_process()?;
            guard.write(
                pid,
                &ProcessRecord {
                    status: SlotStatus::Running,
                    native_id,
                    pgid: pid,
                    ppid: INIT_PID,
                    sid: pid,
                    signal_channel: Some(signals.channel()),
                    exited: false,
                },
            )?;
            pid
        };

        info!(pid, native_id, table = %table.describe(), "process initialized");
        Ok(Self::with_pid(pid, table, signals))
    }

    /// `init` for the calling host process
    pub fn init_current(table: ProcessTable, signals: Arc<dyn SignalHost>) -> ProcessResult<Self> {
        Self::init(table, signals, std::process::id())
    }

    /// Adopt a slot the parent already filled in through `track_child`
    ///
    /// Only the signal channel is recorded; everything else was written by
    /// the parent before the child started running.
    pub fn after_fork(
        table: ProcessTable,
        signals: Arc<dyn SignalHost>,
        pid: Pid,
    ) -> ProcessResult<Self> {
        let channel = signals.channel();
        table.lock()?.update(pid, |record| {
            record.signal_channel = Some(channel);
        })?;

        debug!(pid, %channel, "forked process attached");
        Ok(Self::with_pid(pid, table, signals))
    }

    fn with_pid(pid: Pid, table: ProcessTable, signals: Arc<dyn SignalHost>) -> Self {
        Self {
            pid,
            table,
            children: ChildTracker::with_capacity(MAX_CHILD_COUNT),
            signals,
        }
    }

    #[inline]
    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    #[inline]
    pub fn children(&self) -> &ChildTracker {
        &self.children
    }

    #[inline]
    pub fn signals(&self) -> &Arc<dyn SignalHost> {
        &self.signals
    }

    /// Register a freshly spawned native process as a child
    ///
    /// Allocates the child's identity, inheriting group and session, and
    /// hands it to the signal subsystem for termination notification.
    pub fn track_child(&mut self, native: Arc<dyn NativeChild>) -> ProcessResult<Pid> {
        if !self.children.has_capacity() {
            warn!(pid = self.pid, limit = self.children.capacity(), "child limit reached");
            return Err(ProcessError::resource_exhausted(format!(
                "child limit of {} reached",
                self.children.capacity()
            )));
        }

        let native_id = native.native_id();
        let pid = {
            let mut guard = self.table.lock()?;
            let parent = guard
                .read(self.pid)
                .filter(ProcessRecord::is_running)
                .ok_or(ProcessError::NoSuchProcess(self.pid))?;
            let pid = guard.allocate()?;
            guard.write(
                pid,
                &ProcessRecord {
                    status: SlotStatus::Running,
                    native_id,
                    pgid: parent.pgid,
                    ppid: self.pid,
                    sid: parent.sid,
                    signal_channel: None,
                    exited: false,
                },
            )?;
            pid
        };

        let watch = self.children.insert(pid, native)?;
        if let Err(e) = self.signals.watch_child(watch) {
            if let Some(pos) = self.children.position(pid) {
                self.children.take(pos)?;
            }
            self.table.lock()?.release(pid)?;
            return Err(e);
        }

        info!(parent = self.pid, pid, native_id, "child tracked");
        Ok(pid)
    }

    /// Give up the identity before the native process terminates
    ///
    /// Children that terminated or already shut down are released, live
    /// children are reparented to the root, and the own slot is released
    /// only when no emulated parent is left to reap it. Otherwise it is
    /// marked exited so a parent that shuts down without reaping frees it.
    pub fn shutdown(mut self) -> ProcessResult<()> {
        let children = self.children.drain();
        let mut guard = self.table.lock()?;

        for child in &children {
            let exited = guard.read(child.pid()).is_some_and(|record| record.exited);
            if child.is_terminated() || exited {
                guard.release(child.pid())?;
                debug!(pid = child.pid(), exited, "released unreaped child");
            } else {
                guard.update(child.pid(), |record| record.ppid = INIT_PID)?;
                debug!(pid = child.pid(), "reparented live child to root");
            }
        }

        let own = guard.read(self.pid).ok_or(ProcessError::NoSuchProcess(self.pid))?;
        let orphan = own.ppid == INIT_PID;
        if orphan {
            guard.release(self.pid)?;
        } else {
            guard.update(self.pid, |record| record.exited = true)?;
        }

        info!(
            pid = self.pid,
            children = children.len(),
            released_self = orphan,
            "process shut down"
        );
        Ok(())
    }
}

impl std::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("pid", &self.pid)
            .field("children", &self.children.len())
            .field("channel", &self.signals.channel())
            .finish()
    }
}
