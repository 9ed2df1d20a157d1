/*!
 * Native Child Handles
 * Host processes spawned on behalf of an emulated parent
 */

use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::limits::SIGNALED_EXIT_BASE;
use crate::core::types::{ExitCode, NativeId};
use parking_lot::Mutex;
use std::fmt;
use std::process::{Child, Command};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, warn};

/// Callback run once when the native process terminates
pub type ExitCallback = Box<dyn FnOnce(ExitCode) + Send + 'static>;

/// Handle to a native host process
///
/// Dropping the last reference releases the handle.
pub trait NativeChild: Send + Sync {
    /// Host process id
    fn native_id(&self) -> NativeId;

    /// Exit code, once the process has terminated
    fn exit_code(&self) -> Option<ExitCode>;

    /// Register a termination callback
    ///
    /// Runs immediately on the calling thread if the process already exited.
    fn on_exit(&self, callback: ExitCallback);
}

/// Exit code plus pending callbacks, shared between a handle and its watcher
#[derive(Default)]
struct ExitCell {
    inner: Mutex<ExitCellInner>,
}

#[derive(Default)]
struct ExitCellInner {
    code: Option<ExitCode>,
    callbacks: Vec<ExitCallback>,
}

impl ExitCell {
    fn code(&self) -> Option<ExitCode> {
        self.inner.lock().code
    }

    fn subscribe(&self, callback: ExitCallback) {
        let mut inner = self.inner.lock();
        match inner.code {
            Some(code) => {
                drop(inner);
                callback(code);
            }
            None => inner.callbacks.push(callback),
        }
    }

    /// Record the exit code; returns `false` if it was already recorded
    fn complete(&self, code: ExitCode) -> bool {
        let callbacks = {
            let mut inner = self.inner.lock();
            if inner.code.is_some() {
                return false;
            }
            inner.code = Some(code);
            std::mem::take(&mut inner.callbacks)
        };
        for callback in callbacks {
            callback(code);
        }
        true
    }
}

/// Child whose lifetime is driven by the caller
///
/// Used by the demo binary and the tests to stand in for a host process.
pub struct SimulatedChild {
    id: NativeId,
    exit: ExitCell,
}

impl SimulatedChild {
    pub fn new(id: NativeId) -> Arc<Self> {
        Arc::new(Self {
            id,
            exit: ExitCell::default(),
        })
    }

    /// Terminate the simulated process, firing its callbacks on this thread
    pub fn exit(&self, code: ExitCode) {
        if !self.exit.complete(code) {
            warn!(native_id = self.id, "simulated child exited twice");
        }
    }
}

impl NativeChild for SimulatedChild {
    fn native_id(&self) -> NativeId {
        self.id
    }

    fn exit_code(&self) -> Option<ExitCode> {
        self.exit.code()
    }

    fn on_exit(&self, callback: ExitCallback) {
        self.exit.subscribe(callback);
    }
}

impl fmt::Debug for SimulatedChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedChild")
            .field("id", &self.id)
            .field("exit_code", &self.exit.code())
            .finish()
    }
}

/// Real host process, watched by a dedicated thread
pub struct HostChild {
    id: NativeId,
    exit: Arc<ExitCell>,
}

impl HostChild {
    /// Spawn `command` and start watching it
    pub fn spawn(command: &mut Command) -> ProcessResult<Arc<Self>> {
        let child = command.spawn()?;
        Self::watch(child)
    }

    /// Take ownership of an already spawned process
    pub fn watch(mut child: Child) -> ProcessResult<Arc<Self>> {
        let id = child.id();
        let exit = Arc::new(ExitCell::default());
        let watcher_exit = Arc::clone(&exit);

        thread::Builder::new()
            .name(format!("child-watch-{}", id))
            .spawn(move || {
                let code = match child.wait() {
                    Ok(status) => exit_code_of(status),
                    Err(e) => {
                        error!(native_id = id, error = %e, "failed waiting on native child");
                        SIGNALED_EXIT_BASE
                    }
                };
                debug!(native_id = id, code, "native child terminated");
                watcher_exit.complete(code);
            })
            .map_err(|e| ProcessError::host(format!("spawn watcher thread: {}", e)))?;

        Ok(Arc::new(Self { id, exit }))
    }
}

impl NativeChild for HostChild {
    fn native_id(&self) -> NativeId {
        self.id
    }

    fn exit_code(&self) -> Option<ExitCode> {
        self.exit.code()
    }

    fn on_exit(&self, callback: ExitCallback) {
        self.exit.subscribe(callback);
    }
}

#[cfg(unix)]
fn exit_code_of(status: std::process::ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code as ExitCode,
        (None, Some(signal)) => SIGNALED_EXIT_BASE + signal as ExitCode,
        (None, None) => SIGNALED_EXIT_BASE,
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: std::process::ExitStatus) -> ExitCode {
    status.code().map_or(SIGNALED_EXIT_BASE, |code| code as ExitCode)
}
