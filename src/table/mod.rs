/*!
 * Process Table Module
 * The cross-process table of POSIX identities
 *
 * # Locking discipline
 *
 * - Writes to any slot require the table lock
 * - Reads of another process's slot require the table lock
 * - A process may read its own slot without locking
 *
 * All locked access goes through `TableGuard`, which releases the lock on
 * drop so every exit path of a locked section unlocks.
 */

pub mod lock;
pub mod shared;
pub mod slot;
pub mod storage;

pub use lock::{LocalLock, TableLock};
pub use shared::{ProcessTable, TableGuard};
pub use slot::{ProcessRecord, SlotStatus};
pub use storage::{HeapStorage, TableRegion, TableStorage};

#[cfg(unix)]
pub use lock::FileLock;
#[cfg(unix)]
pub use storage::MappedStorage;
