/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::inline_string::InlineString;
use crate::core::types::Pid;
use miette::Diagnostic;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for process identity operations
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process identity and reaping errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("No such child: {0}")]
    #[diagnostic(
        code(process::no_such_child),
        help("The target is not an unreaped child of the caller, or nothing is ready yet.")
    )]
    NoSuchChild(InlineString),

    #[error("Wait interrupted by signal")]
    #[diagnostic(
        code(process::interrupted),
        help("A signal arrived while blocked. Handle it and retry the wait.")
    )]
    Interrupted,

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(process::invalid_argument))]
    InvalidArgument(InlineString),

    #[error("Process {0} does not exist")]
    #[diagnostic(
        code(process::no_such_process),
        help("The pid is not live in the shared process table.")
    )]
    NoSuchProcess(Pid),

    #[error("Permission denied: {0}")]
    #[diagnostic(code(process::permission_denied))]
    PermissionDenied(InlineString),

    #[error("Resource exhausted: {0}")]
    #[diagnostic(
        code(process::resource_exhausted),
        help("A fixed-capacity table is full. Reap finished children or raise the capacity.")
    )]
    ResourceExhausted(InlineString),

    #[error("Host primitive failed: {0}")]
    #[diagnostic(
        code(process::host_failure),
        help("The shared mapping, lock file or native handle could not be used.")
    )]
    Host(InlineString),

    #[error("Internal invariant violated: {0}")]
    #[diagnostic(
        code(process::internal),
        help("Shared state is inconsistent. Please report this issue.")
    )]
    Internal(InlineString),
}

impl ProcessError {
    #[inline]
    pub fn no_such_child(msg: impl Into<InlineString>) -> Self {
        Self::NoSuchChild(msg.into())
    }

    #[inline]
    pub fn invalid_argument(msg: impl Into<InlineString>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    #[inline]
    pub fn permission_denied(msg: impl Into<InlineString>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    #[inline]
    pub fn resource_exhausted(msg: impl Into<InlineString>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    #[inline]
    pub fn host(msg: impl Into<InlineString>) -> Self {
        Self::Host(msg.into())
    }

    #[inline]
    pub fn internal(msg: impl Into<InlineString>) -> Self {
        Self::Internal(msg.into())
    }

    /// Errors the caller cannot recover from by retrying
    ///
    /// Exhaustion is a capacity ceiling and internal errors mean the shared
    /// state can no longer be trusted; both propagate to the top level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ResourceExhausted(_) | Self::Internal(_))
    }

    /// Linux errno reported to the emulated binary
    pub fn errno(&self) -> Errno {
        match self {
            Self::NoSuchChild(_) => Errno::ECHILD,
            Self::Interrupted => Errno::EINTR,
            Self::InvalidArgument(_) => Errno::EINVAL,
            Self::NoSuchProcess(_) => Errno::ESRCH,
            Self::PermissionDenied(_) => Errno::EPERM,
            Self::ResourceExhausted(_) => Errno::EAGAIN,
            Self::Host(_) | Self::Internal(_) => Errno::EIO,
        }
    }
}

impl From<std::io::Error> for ProcessError {
    fn from(err: std::io::Error) -> Self {
        ProcessError::Host(err.to_string().into())
    }
}

impl From<Errno> for ProcessError {
    fn from(err: Errno) -> Self {
        ProcessError::Host(err.desc().into())
    }
}
