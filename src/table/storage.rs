/*!
 * Table Storage
 * Backing memory for the shared process table
 *
 * The region is plain `#[repr(C)]` atomics with no pointers inside, so the
 * same bytes work from heap memory (single host process, tests) or from a
 * file-backed `MAP_SHARED` mapping visible to every emulated process, at
 * whatever address each process happens to map it.
 */

use super::slot::SlotCell;
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::limits::MAX_PROCESS_COUNT;
use std::sync::atomic::AtomicI32;

/// Shared layout: allocation cursor plus the fixed slot array
#[repr(C)]
pub struct TableRegion {
    /// Last pid handed out by the allocator
    pub(crate) last_allocated: AtomicI32,
    /// Slot 0 is never used
    pub(crate) slots: [SlotCell; MAX_PROCESS_COUNT],
}

impl TableRegion {
    pub fn new() -> Self {
        const EMPTY: SlotCell = SlotCell::new();
        Self {
            last_allocated: AtomicI32::new(0),
            slots: [EMPTY; MAX_PROCESS_COUNT],
        }
    }

    /// Size in bytes of the shared layout
    pub const fn byte_len() -> usize {
        std::mem::size_of::<Self>()
    }
}

impl Default for TableRegion {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider of the table's backing memory
pub trait TableStorage: Send + Sync {
    /// The shared region
    fn region(&self) -> &TableRegion;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Heap-backed storage shared by handles inside one host process
pub struct HeapStorage {
    region: Box<TableRegion>,
}

impl HeapStorage {
    pub fn new() -> Self {
        Self {
            region: Box::new(TableRegion::new()),
        }
    }
}

impl Default for HeapStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStorage for HeapStorage {
    #[inline]
    fn region(&self) -> &TableRegion {
        &self.region
    }

    fn describe(&self) -> String {
        "heap".to_string()
    }
}

#[cfg(unix)]
pub use mapped::MappedStorage;

#[cfg(unix)]
mod mapped {
    use super::*;
    use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
    use std::ffi::c_void;
    use std::fs::{File, OpenOptions};
    use std::num::NonZeroUsize;
    use std::path::{Path, PathBuf};
    use std::ptr::NonNull;
    use tracing::{debug, error};

    /// File-backed `MAP_SHARED` storage visible to every process mapping the same file
    ///
    /// A freshly created file is zero-filled, which is a valid empty table.
    pub struct MappedStorage {
        ptr: NonNull<TableRegion>,
        len: usize,
        path: PathBuf,
        _file: File,
    }

    // SAFETY: the mapping is only reached through `&TableRegion`, whose fields
    // are all atomics; the pointer stays valid until `Drop` unmaps it.
    unsafe impl Send for MappedStorage {}
    unsafe impl Sync for MappedStorage {}

    impl MappedStorage {
        /// Map the table file at `path`, creating and sizing it if needed
        pub fn open(path: impl AsRef<Path>) -> ProcessResult<Self> {
            let path = path.as_ref().to_path_buf();
            let len = TableRegion::byte_len();

            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)?;

            let current = file.metadata()?.len();
            if current < len as u64 {
                // Extending with ftruncate zero-fills; racing openers set the same size
                file.set_len(len as u64)?;
            } else if current > len as u64 {
                return Err(ProcessError::host(format!(
                    "table file {} has size {} but layout needs {}",
                    path.display(),
                    current,
                    len
                )));
            }

            let length = NonZeroUsize::new(len)
                .ok_or_else(|| ProcessError::internal("empty table layout"))?;

            // SAFETY: mapping a regular file we hold open, with a length equal
            // to its size; no existing Rust references alias the new mapping.
            let addr = unsafe {
                mmap(
                    None,
                    length,
                    ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                    MapFlags::MAP_SHARED,
                    &file,
                    0,
                )
            }?;

            debug!(path = %path.display(), len, "mapped shared process table");

            Ok(Self {
                ptr: addr.cast::<TableRegion>(),
                len,
                path,
                _file: file,
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl TableStorage for MappedStorage {
        #[inline]
        fn region(&self) -> &TableRegion {
            // SAFETY: the mapping is page aligned, `len` bytes long and lives
            // as long as `self`; every bit pattern of the region is valid.
            unsafe { self.ptr.as_ref() }
        }

        fn describe(&self) -> String {
            format!("mapped:{}", self.path.display())
        }
    }

    impl Drop for MappedStorage {
        fn drop(&mut self) {
            // SAFETY: `ptr`/`len` come from the successful mmap in `open`
            let result = unsafe { munmap(self.ptr.cast::<c_void>(), self.len) };
            if let Err(e) = result {
                error!(path = %self.path.display(), error = %e, "failed to unmap process table");
            }
        }
    }
}
