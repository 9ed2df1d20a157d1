/*!
 * Signal Types
 * Handles and outcomes exchanged with the signal subsystem
 */

use super::native::NativeChild;
use crate::core::types::Pid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reference to the mechanism that pushes signals into a process
///
/// Owned by the signal subsystem; the process table only records it so
/// other processes can find where to deliver. Zero is reserved for
/// "no channel", which lets the raw value live in shared memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalChannel(NonZeroU64);

impl SignalChannel {
    /// Wrap a raw channel value, `None` for zero
    #[inline]
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[inline]
    pub fn from_nonzero(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for SignalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chan:{:#x}", self.0)
    }
}

/// One-shot flag raised by the termination callback of a tracked child
#[derive(Debug, Clone, Default)]
pub struct TerminationFlag(Arc<AtomicBool>);

impl TerminationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag, returning `true` only for the first caller
    #[inline]
    pub fn set(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

/// Outcome of a blocking, signal-interruptible wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// The awaited object became ready
    Ready(T),
    /// A signal was delivered to the waiting process
    Interrupted,
    /// The optional timeout elapsed first
    TimedOut,
}

impl<T> WaitOutcome<T> {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready(_))
    }
}

/// A tracked child as registered with the signal subsystem
#[derive(Clone)]
pub struct ChildWatch {
    pub pid: Pid,
    pub native: Arc<dyn NativeChild>,
    pub terminated: TerminationFlag,
}

impl fmt::Debug for ChildWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildWatch")
            .field("pid", &self.pid)
            .field("native_id", &self.native.native_id())
            .field("terminated", &self.terminated.is_set())
            .finish()
    }
}
