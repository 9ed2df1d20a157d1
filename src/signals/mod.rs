/*!
 * Signals Module
 * Interface to the signal subsystem plus an in-process stand-in
 *
 * The process layer only consumes signals: it records delivery channels,
 * registers children for termination watching and blocks in
 * signal-interruptible waits. Delivery itself lives elsewhere.
 */

mod local;
pub mod native;
pub mod traits;
pub mod types;

pub use local::LocalSignalHost;
pub use native::{ExitCallback, HostChild, NativeChild, SimulatedChild};
pub use traits::SignalHost;
pub use types::{ChildWatch, SignalChannel, TerminationFlag, WaitOutcome};
