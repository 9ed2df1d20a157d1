/*!
 * Signal Traits
 * What the process layer consumes from the signal subsystem
 */

use super::types::{ChildWatch, SignalChannel, WaitOutcome};
use crate::core::errors::ProcessResult;
use std::time::Duration;

/// Signal subsystem of one emulated process
///
/// Owns the delivery channel and the termination-notification counter:
/// a counting semaphore posted exactly once per tracked child termination
/// and consumed exactly once per successful reap.
pub trait SignalHost: Send + Sync {
    /// Channel other processes use to deliver signals to this one
    fn channel(&self) -> SignalChannel;

    /// Start observing a tracked child
    ///
    /// On termination the subsystem raises `watch.terminated` and then posts
    /// the termination counter, each exactly once.
    fn watch_child(&self, watch: ChildWatch) -> ProcessResult<()>;

    /// Block until the child has terminated or a signal arrives
    ///
    /// Consumes nothing from the termination counter.
    fn wait_child(&self, watch: &ChildWatch, timeout: Option<Duration>) -> WaitOutcome<()>;

    /// Block until the termination counter is positive or a signal arrives,
    /// consuming one unit on success
    fn wait_termination(&self, timeout: Option<Duration>) -> WaitOutcome<()>;

    /// Consume one unit, blocking without regard to signals until one is posted
    fn consume_termination(&self);

    /// Current counter value (diagnostics)
    fn pending_terminations(&self) -> usize;
}
