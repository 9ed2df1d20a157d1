/*!
 * Process Module
 * Emulated process identity, child tracking and reaping
 *
 * A `ProcessContext` is the per-process view over the shared table. The
 * tracker and signal host are private to the process; the table is the
 * only state shared with other processes.
 */

pub mod children;
pub mod context;
pub mod identity;
pub mod wait;

pub use children::{ChildRecord, ChildTracker};
pub use context::ProcessContext;
pub use wait::{Reaped, WaitOptions, WaitStatus, WaitTarget};
