/*!
 * Local Signal Host
 * In-process stand-in for the signal subsystem
 *
 * One instance per emulated process. Signals delivered through
 * `deliver_signal` stay pending until `take_pending` dispatches them; while
 * any signal is pending, blocking waits report `Interrupted`.
 */

use super::traits::SignalHost;
use super::types::{ChildWatch, SignalChannel, WaitOutcome};
use crate::core::errors::ProcessResult;
use crate::core::types::SignalNumber;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

static NEXT_CHANNEL: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct HostState {
    /// Termination-notification counter
    terminations: usize,
    /// Delivered but not yet dispatched signals
    pending: Vec<SignalNumber>,
}

struct Shared {
    state: Mutex<HostState>,
    cond: Condvar,
}

impl Shared {
    fn post_termination(&self) {
        let mut state = self.state.lock();
        state.terminations += 1;
        self.cond.notify_all();
    }

    /// Park until notified or the deadline passes; returns `false` on timeout
    fn park(&self, state: &mut MutexGuard<'_, HostState>, deadline: Option<Instant>) -> bool {
        match deadline {
            Some(deadline) => !self.cond.wait_until(state, deadline).timed_out(),
            None => {
                self.cond.wait(state);
                true
            }
        }
    }
}

/// Signal subsystem stand-in built on parking_lot primitives
#[derive(Clone)]
pub struct LocalSignalHost {
    channel: SignalChannel,
    shared: Arc<Shared>,
}

impl LocalSignalHost {
    pub fn new() -> Self {
        let serial = NEXT_CHANNEL.fetch_add(1, Ordering::Relaxed);
        let raw = (u64::from(std::process::id()) << 32) | (serial & 0xffff_ffff);
        Self {
            channel: SignalChannel::from_nonzero(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN)),
            shared: Arc::new(Shared {
                state: Mutex::new(HostState::default()),
                cond: Condvar::new(),
            }),
        }
    }

    /// Deliver a signal, waking any blocked wait
    pub fn deliver_signal(&self, signal: SignalNumber) {
        let mut state = self.shared.state.lock();
        state.pending.push(signal);
        self.shared.cond.notify_all();
        debug!(signal, channel = %self.channel, "signal delivered");
    }

    pub fn has_pending(&self) -> bool {
        !self.shared.state.lock().pending.is_empty()
    }

    /// Dispatch pending signals, returning them in delivery order
    pub fn take_pending(&self) -> Vec<SignalNumber> {
        std::mem::take(&mut self.shared.state.lock().pending)
    }
}

impl Default for LocalSignalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHost for LocalSignalHost {
    fn channel(&self) -> SignalChannel {
        self.channel
    }

    fn watch_child(&self, watch: ChildWatch) -> ProcessResult<()> {
        let shared = Arc::clone(&self.shared);
        let flag = watch.terminated.clone();
        let pid = watch.pid;
        watch.native.on_exit(Box::new(move |code| {
            if flag.set() {
                trace!(pid, code, "tracked child terminated");
                shared.post_termination();
            }
        }));
        Ok(())
    }

    fn wait_child(&self, watch: &ChildWatch, timeout: Option<Duration>) -> WaitOutcome<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();
        loop {
            if watch.terminated.is_set() {
                return WaitOutcome::Ready(());
            }
            if !state.pending.is_empty() {
                return WaitOutcome::Interrupted;
            }
            if !self.shared.park(&mut state, deadline) {
                return WaitOutcome::TimedOut;
            }
        }
    }

    fn wait_termination(&self, timeout: Option<Duration>) -> WaitOutcome<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();
        loop {
            if state.terminations > 0 {
                state.terminations -= 1;
                return WaitOutcome::Ready(());
            }
            if !state.pending.is_empty() {
                return WaitOutcome::Interrupted;
            }
            if !self.shared.park(&mut state, deadline) {
                return WaitOutcome::TimedOut;
            }
        }
    }

    fn consume_termination(&self) {
        let mut state = self.shared.state.lock();
        while state.terminations == 0 {
            self.shared.cond.wait(&mut state);
        }
        state.terminations -= 1;
    }

    fn pending_terminations(&self) -> usize {
        self.shared.state.lock().terminations
    }
}
