/*!
 * procs - process identity demo
 *
 * Joins the shared process table, optionally runs one command as a
 * tracked child and reaps it, then prints the live pid listing.
 *
 *   procs [command [args...]]
 */

use posix_procs::{
    init_tracing, EmulationConfig, HostChild, LocalSignalHost, ProcPidDirectory, ProcessContext,
    SyscallExecutor,
};
use std::process::Command;
use std::sync::Arc;
use tracing::{error, info};

fn main() -> miette::Result<()> {
    let config = EmulationConfig::from_env()?;
    init_tracing(config.trace_json);

    let table = config.open_table()?;
    let signals = Arc::new(LocalSignalHost::new());
    let context = ProcessContext::init_current(table.clone(), signals)?;
    let mut executor = SyscallExecutor::new(context);

    let pid = executor.getpid().unwrap_or_default();
    println!("pid {} (ppid {})", pid, executor.getppid().unwrap_or_default());

    let mut args = std::env::args().skip(1);
    let mut exit_status = 0;
    if let Some(program) = args.next() {
        let native = HostChild::spawn(Command::new(&program).args(args))?;
        let child = executor.context_mut().track_child(native)?;
        info!(child, program = %program, "spawned");

        let mut status = 0;
        match executor.waitpid(child, Some(&mut status), 0) {
            Ok(reaped) => {
                exit_status = (status >> 8) & 0xff;
                println!("reaped {} with exit code {}", reaped, exit_status);
            }
            Err(errno) => {
                error!(child, %errno, "waitpid failed");
                exit_status = 1;
            }
        }
    }

    let pids = ProcPidDirectory::new(table).list()?;
    println!(
        "live: {}",
        pids.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" ")
    );

    executor.exit_group(exit_status)
}
