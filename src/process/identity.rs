/*!
 * Identity Queries
 * Pid, parent, group and session lookups plus group/session changes
 */

use super::context::ProcessContext;
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::Pid;
use crate::table::ProcessRecord;
use tracing::{debug, info};

impl ProcessContext {
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Threads are not modelled separately
    #[inline]
    pub fn tid(&self) -> Pid {
        self.pid
    }

    pub fn ppid(&self) -> ProcessResult<Pid> {
        Ok(self.table.own_record(self.pid)?.ppid)
    }

    pub fn sid(&self) -> ProcessResult<Pid> {
        Ok(self.table.own_record(self.pid)?.sid)
    }

    /// Process group of `pid`, 0 meaning the caller
    pub fn pgid(&self, pid: Pid) -> ProcessResult<Pid> {
        Ok(self.lookup(pid)?.pgid)
    }

    /// Session of `pid`, 0 meaning the caller
    pub fn sid_of(&self, pid: Pid) -> ProcessResult<Pid> {
        Ok(self.lookup(pid)?.sid)
    }

    pub fn pgrp(&self) -> ProcessResult<Pid> {
        self.pgid(0)
    }

    /// Whether `pid` names a live or unreaped process
    pub fn process_exists(&self, pid: Pid) -> ProcessResult<bool> {
        if pid == self.pid {
            return Ok(self.table.own_record(pid)?.is_running());
        }
        Ok(self.table.lock()?.exists(pid))
    }

    /// Own slot without the lock, anyone else's under it
    fn lookup(&self, pid: Pid) -> ProcessResult<ProcessRecord> {
        let record = if pid == 0 || pid == self.pid {
            self.table.own_record(self.pid)?
        } else {
            self.table
                .lock()?
                .read(pid)
                .ok_or(ProcessError::NoSuchProcess(pid))?
        };
        if !record.is_running() {
            return Err(ProcessError::NoSuchProcess(pid));
        }
        Ok(record)
    }

    /// Move the caller or one of its children into a process group
    ///
    /// `pid` 0 means the caller and `pgid` 0 means `pid` itself. The target
    /// stays in its session; joining a group that does not exist there is
    /// only allowed when the target founds it.
    pub fn set_pgid(&self, pid: Pid, pgid: Pid) -> ProcessResult<()> {
        if pid < 0 || pgid < 0 {
            return Err(ProcessError::invalid_argument(format!(
                "setpgid({}, {})",
                pid, pgid
            )));
        }
        let target = if pid == 0 { self.pid } else { pid };
        let pgid = if pgid == 0 { target } else { pgid };

        if target != self.pid && self.children.position(target).is_none() {
            return Err(ProcessError::NoSuchProcess(target));
        }

        let mut guard = self.table.lock()?;
        let caller = guard
            .read(self.pid)
            .filter(ProcessRecord::is_running)
            .ok_or(ProcessError::NoSuchProcess(self.pid))?;
        let record = guard
            .read(target)
            .filter(ProcessRecord::is_running)
            .ok_or(ProcessError::NoSuchProcess(target))?;

        if record.sid != caller.sid {
            return Err(ProcessError::permission_denied(format!(
                "{} is in another session",
                target
            )));
        }
        if record.sid == target {
            return Err(ProcessError::permission_denied(format!(
                "{} is a session leader",
                target
            )));
        }
        if pgid != target && !guard.group_exists(pgid, Some(caller.sid)) {
            return Err(ProcessError::permission_denied(format!(
                "no group {} in session {}",
                pgid, caller.sid
            )));
        }

        guard.update(target, |record| record.pgid = pgid)?;
        debug!(caller = self.pid, pid = target, pgid, "process group changed");
        Ok(())
    }

    /// Start a new session led by the caller, returning its id
    pub fn set_sid(&self) -> ProcessResult<Pid> {
        let mut guard = self.table.lock()?;
        let own = guard
            .read(self.pid)
            .filter(ProcessRecord::is_running)
            .ok_or(ProcessError::NoSuchProcess(self.pid))?;

        if own.pgid == self.pid || guard.group_exists(self.pid, None) {
            return Err(ProcessError::permission_denied(format!(
                "{} already leads a process group",
                self.pid
            )));
        }

        let pid = self.pid;
        guard.update(pid, |record| {
            record.sid = pid;
            record.pgid = pid;
        })?;
        info!(pid, "new session started");
        Ok(pid)
    }
}
