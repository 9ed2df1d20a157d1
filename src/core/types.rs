/*!
 * Core Types
 * Common types used across the emulation layer
 */

/// POSIX process identifier as seen by emulated binaries
///
/// Signed because the wait family encodes "any child" and group targets
/// as negative values.
pub type Pid = i32;

/// Identifier of the underlying native host process
pub type NativeId = u32;

/// Raw exit code reported by a native process
pub type ExitCode = u32;

/// Raw Linux signal number
pub type SignalNumber = i32;
