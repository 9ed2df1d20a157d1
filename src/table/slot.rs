/*!
 * Process Table Slots
 * Shared-memory layout of one process record and its plain snapshot
 */

use crate::core::limits::INIT_PID;
use crate::core::types::{NativeId, Pid};
use crate::signals::SignalChannel;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};

/// Status of a table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum SlotStatus {
    /// The process does not exist
    NotExist = 0,
    /// The process is live or not yet reaped
    Running = 1,
}

impl SlotStatus {
    #[inline]
    fn from_raw(raw: u32) -> Self {
        match raw {
            0 => SlotStatus::NotExist,
            _ => SlotStatus::Running,
        }
    }
}

/// Copy of one slot, detached from shared memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessRecord {
    pub status: SlotStatus,
    /// Native host process id (0 for the synthetic root)
    pub native_id: NativeId,
    pub pgid: Pid,
    pub ppid: Pid,
    pub sid: Pid,
    pub signal_channel: Option<SignalChannel>,
    /// Set when the process shut down and left its slot for the parent's reap
    #[serde(default)]
    pub exited: bool,
}

impl ProcessRecord {
    /// An unused slot
    pub const fn vacant() -> Self {
        Self {
            status: SlotStatus::NotExist,
            native_id: 0,
            pgid: 0,
            ppid: 0,
            sid: 0,
            signal_channel: None,
            exited: false,
        }
    }

    /// The synthetic init identity living in slot 1
    pub const fn root() -> Self {
        Self {
            status: SlotStatus::Running,
            native_id: 0,
            pgid: INIT_PID,
            ppid: 0,
            sid: INIT_PID,
            signal_channel: None,
            exited: false,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.status == SlotStatus::Running
    }
}

/// One slot as laid out in the shared region
///
/// Every field is an atomic so that a zero-filled mapping is a valid empty
/// table and lock-free reads of the caller's own slot are well defined.
#[repr(C)]
pub struct SlotCell {
    status: AtomicU32,
    native_id: AtomicU32,
    pgid: AtomicI32,
    ppid: AtomicI32,
    sid: AtomicI32,
    signal_channel: AtomicU64,
    exited: AtomicU32,
}

impl SlotCell {
    pub const fn new() -> Self {
        Self {
            status: AtomicU32::new(SlotStatus::NotExist as u32),
            native_id: AtomicU32::new(0),
            pgid: AtomicI32::new(0),
            ppid: AtomicI32::new(0),
            sid: AtomicI32::new(0),
            signal_channel: AtomicU64::new(0),
            exited: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn status(&self) -> SlotStatus {
        SlotStatus::from_raw(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set_status(&self, status: SlotStatus) {
        self.status.store(status as u32, Ordering::Release);
    }

    #[inline]
    pub(crate) fn set_exited(&self, exited: bool) {
        self.exited.store(u32::from(exited), Ordering::Release);
    }

    pub(crate) fn load(&self) -> ProcessRecord {
        ProcessRecord {
            status: self.status(),
            native_id: self.native_id.load(Ordering::Acquire),
            pgid: self.pgid.load(Ordering::Acquire),
            ppid: self.ppid.load(Ordering::Acquire),
            sid: self.sid.load(Ordering::Acquire),
            signal_channel: SignalChannel::new(self.signal_channel.load(Ordering::Acquire)),
            exited: self.exited.load(Ordering::Acquire) != 0,
        }
    }

    /// Publish a record; status goes last so readers never see a half-filled Running slot
    pub(crate) fn store(&self, record: &ProcessRecord) {
        self.native_id.store(record.native_id, Ordering::Release);
        self.pgid.store(record.pgid, Ordering::Release);
        self.ppid.store(record.ppid, Ordering::Release);
        self.sid.store(record.sid, Ordering::Release);
        self.signal_channel.store(
            record.signal_channel.map(SignalChannel::raw).unwrap_or(0),
            Ordering::Release,
        );
        self.set_exited(record.exited);
        self.set_status(record.status);
    }
}

impl Default for SlotCell {
    fn default() -> Self {
        Self::new()
    }
}
