/*!
 * Syscall Executor
 * Syscall entry points of one emulated process
 */

use crate::core::errors::ProcessResult;
use crate::monitoring::{span_syscall, SyscallSpan};
use crate::process::ProcessContext;
use nix::errno::Errno;
use tracing::info;

/// Syscall surface bound to a process context
///
/// Handlers live in sibling modules as `impl SyscallExecutor` blocks,
/// grouped by area.
pub struct SyscallExecutor {
    pub(super) context: ProcessContext,
}

impl SyscallExecutor {
    pub fn new(context: ProcessContext) -> Self {
        info!(pid = context.pid(), "syscall executor ready");
        Self { context }
    }

    #[inline]
    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut ProcessContext {
        &mut self.context
    }

    pub fn into_context(self) -> ProcessContext {
        self.context
    }

    #[inline]
    pub(super) fn span(&self, syscall: &'static str) -> SyscallSpan {
        span_syscall(syscall, self.context.pid())
    }

    /// Convert a process-layer result, recording any errno on the span
    pub(super) fn finish<T>(span: &SyscallSpan, result: ProcessResult<T>) -> Result<T, Errno> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                let errno = e.errno();
                span.record_errno(errno);
                Err(errno)
            }
        }
    }
}
