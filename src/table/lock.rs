/*!
 * Table Locks
 * Cross-process mutual exclusion for the shared process table
 *
 * The lock must be held when writing any slot and when reading a slot
 * other than the caller's own. Acquire and release are separate calls so
 * a directory listing can hold the lock across several iteration steps;
 * in-crate callers go through the RAII `TableGuard` instead.
 */

use crate::core::errors::{ProcessError, ProcessResult};
use parking_lot::lock_api::RawMutex as RawMutexApi;
use parking_lot::RawMutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Timeout-free lock abstraction over the table
pub trait TableLock: Send + Sync {
    /// Block until the lock is held
    fn acquire(&self) -> ProcessResult<()>;

    /// Release a lock previously taken with `acquire` in the same context
    fn release(&self) -> ProcessResult<()>;

    /// Lock name for logs
    fn name(&self) -> &str;
}

/// In-process stand-in lock built on a parking_lot raw mutex
///
/// Every emulated process sharing a `HeapStorage` must share one `LocalLock`.
pub struct LocalLock {
    raw: RawMutex,
    held: AtomicBool,
    name: String,
}

impl LocalLock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            raw: RawMutex::INIT,
            held: AtomicBool::new(false),
            name: name.into(),
        }
    }

    /// Whether some holder currently owns the lock
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl Default for LocalLock {
    fn default() -> Self {
        Self::new("process-table")
    }
}

impl TableLock for LocalLock {
    fn acquire(&self) -> ProcessResult<()> {
        self.raw.lock();
        self.held.store(true, Ordering::Release);
        Ok(())
    }

    fn release(&self) -> ProcessResult<()> {
        if !self.held.swap(false, Ordering::AcqRel) {
            return Err(ProcessError::internal("table lock released while not held"));
        }
        // SAFETY: `held` was set by a matching `acquire`, so the raw mutex is locked
        unsafe { self.raw.unlock() };
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(unix)]
pub use file::FileLock;

#[cfg(unix)]
mod file {
    use super::*;
    use nix::fcntl::{Flock, FlockArg};
    use parking_lot::Mutex;
    use std::fs::{File, OpenOptions};
    use std::path::{Path, PathBuf};
    use tracing::debug;

    enum FlockState {
        Unlocked(File),
        Locked(Flock<File>),
        /// Only observable if a previous transition panicked
        Vacant,
    }

    /// Named lock shared between host processes through `flock(2)` on a lock file
    ///
    /// `flock` excludes other open file descriptions, not other threads using
    /// the same one, so a local raw mutex serializes holders inside this process.
    pub struct FileLock {
        local: LocalLock,
        state: Mutex<FlockState>,
        path: PathBuf,
        name: String,
    }

    impl FileLock {
        pub fn open(path: impl AsRef<Path>) -> ProcessResult<Self> {
            let path = path.as_ref().to_path_buf();
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)?;
            debug!(path = %path.display(), "opened table lock file");
            Ok(Self {
                local: LocalLock::new(path.display().to_string()),
                state: Mutex::new(FlockState::Unlocked(file)),
                name: path.display().to_string(),
                path,
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl TableLock for FileLock {
        fn acquire(&self) -> ProcessResult<()> {
            self.local.acquire()?;
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, FlockState::Vacant) {
                FlockState::Unlocked(file) => match Flock::lock(file, FlockArg::LockExclusive) {
                    Ok(locked) => {
                        *state = FlockState::Locked(locked);
                        Ok(())
                    }
                    Err((file, errno)) => {
                        *state = FlockState::Unlocked(file);
                        drop(state);
                        self.local.release()?;
                        Err(ProcessError::host(format!("flock {}: {}", self.name, errno)))
                    }
                },
                other => {
                    *state = other;
                    drop(state);
                    self.local.release()?;
                    Err(ProcessError::internal("lock file already held by this handle"))
                }
            }
        }

        fn release(&self) -> ProcessResult<()> {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, FlockState::Vacant) {
                FlockState::Locked(locked) => match locked.unlock() {
                    Ok(file) => {
                        *state = FlockState::Unlocked(file);
                        drop(state);
                        self.local.release()
                    }
                    Err((locked, errno)) => {
                        *state = FlockState::Locked(locked);
                        Err(ProcessError::host(format!("unlock {}: {}", self.name, errno)))
                    }
                },
                other => {
                    *state = other;
                    Err(ProcessError::internal("table lock released while not held"))
                }
            }
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}
