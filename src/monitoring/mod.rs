/*!
 * Monitoring Module
 * Structured logging setup and syscall spans
 */

pub mod tracer;

pub use tracer::{init_tracing, span_syscall, SyscallSpan};
