/*!
 * Tracing
 * Subscriber setup and per-syscall spans using the tracing crate
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Syscalls slower than this are reported at warn level
const SLOW_SYSCALL_MS: u128 = 10;

/// Install the global subscriber
///
/// `RUST_LOG` selects the level (default: info). Returns `false` if a
/// subscriber was already installed, which is harmless in tests.
pub fn init_tracing(json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json, "tracing initialized");
    }
    installed
}

/// Span covering one emulated syscall
///
/// Logs entry on creation and duration on drop.
pub struct SyscallSpan {
    span: tracing::Span,
    start: Instant,
    syscall: &'static str,
    trace_id: String,
}

impl SyscallSpan {
    pub fn new(syscall: &'static str, pid: i32) -> Self {
        let trace_id = Uuid::new_v4().to_string();
        let span = span!(
            Level::DEBUG,
            "syscall",
            trace_id = %trace_id,
            syscall,
            pid,
            errno = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );
        {
            let _entered = span.enter();
            debug!(syscall, pid, "syscall entered");
        }
        Self {
            span,
            start: Instant::now(),
            syscall,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_errno(&self, errno: nix::errno::Errno) {
        self.span.record("errno", tracing::field::display(errno));
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.span.record("duration_us", elapsed.as_micros() as u64);
        let _entered = self.span.enter();
        if elapsed.as_millis() > SLOW_SYSCALL_MS {
            warn!(
                trace_id = %self.trace_id,
                syscall = self.syscall,
                duration_ms = elapsed.as_millis() as u64,
                "slow syscall"
            );
        } else {
            debug!(syscall = self.syscall, duration_us = elapsed.as_micros() as u64, "syscall completed");
        }
    }
}

#[inline]
pub fn span_syscall(syscall: &'static str, pid: i32) -> SyscallSpan {
    SyscallSpan::new(syscall, pid)
}
