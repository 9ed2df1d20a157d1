/*!
 * Syscalls Module
 * Linux-style entry points for process identity and reaping
 *
 * Handlers return `SyscallReturn`; `into_raw` produces the negated-errno
 * value an emulated binary expects in its return register.
 */

mod credentials;
mod executor;
mod identity;
mod process;
mod system;
mod types;

pub use credentials::ResIds;
pub use executor::SyscallExecutor;
pub use types::{into_raw, resource, OldUtsname, Rlimit, SyscallReturn, Sysinfo, Utsname};
