//! Launches each command as a stopped child process.
//!
//! The child raises `SIGSTOP` between `fork` and `exec`, so it cannot run a
//! single instruction of the target program before the dispatcher delivers
//! its first `SIGCONT`. The parent observes the stop with
//! `waitpid(WUNTRACED)` before returning the job, which closes the admission
//! boundary: a returned job is stopped, not merely about-to-stop. The
//! self-stop idiom is portability-sensitive; it assumes POSIX job-control
//! semantics.

use std::ffi::CString;
use std::io;

use nix::sys::signal::{raise, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};

use crate::error::{Result, UschedError};
use crate::input::CommandSpec;
use crate::scheduler::Job;

/// Fork one stopped child for `spec` and return its control block in state
/// `Queued`. A spawn failure is fatal to the whole run; an unexecutable
/// program is not detected here: exec fails inside the child after its
/// first resume, and the child exits 127.
pub fn launch(spec: &CommandSpec) -> Result<Job> {
    if spec.program.is_empty() {
        return Err(UschedError::EmptyCommand);
    }

    // The child may only make async-signal-safe calls between fork and
    // exec, so the argv must be fully built before forking.
    let argv = build_argv(spec)?;

    match unsafe { fork() } {
        Ok(ForkResult::Child) => run_child(&argv),
        Ok(ForkResult::Parent { child }) => admit(child, spec),
        Err(source) => Err(UschedError::Launch {
            command: spec.line.clone(),
            source: io::Error::from_raw_os_error(source as i32),
        }),
    }
}

/// Launch every spec in input order. The first spawn failure aborts; jobs
/// launched up to that point are not rolled back.
pub fn launch_all(specs: &[CommandSpec]) -> Result<Vec<Job>> {
    let mut jobs = Vec::with_capacity(specs.len());
    for spec in specs {
        let job = launch(spec)?;
        tracing::info!(pid = %job.pid(), command = job.command(), "job launched");
        jobs.push(job);
    }
    Ok(jobs)
}

fn run_child(argv: &[CString]) -> ! {
    // Stop before exec; the dispatcher decides when this job first runs.
    let _ = raise(Signal::SIGSTOP);
    let _ = execvp(&argv[0], argv);
    let _ = nix::unistd::write(std::io::stderr(), b"usched: exec failed\n");
    // 127 is the shell convention for a command that could not be run.
    unsafe { libc::_exit(127) }
}

fn admit(pid: Pid, spec: &CommandSpec) -> Result<Job> {
    match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
        Ok(WaitStatus::Stopped(_, _)) => {
            let mut job = Job::new(pid, spec.line.clone());
            job.admit();
            Ok(job)
        }
        Ok(status) => Err(UschedError::Launch {
            command: spec.line.clone(),
            source: io::Error::other(format!("child reported {status:?} before admission")),
        }),
        Err(source) => Err(UschedError::Launch {
            command: spec.line.clone(),
            source: io::Error::from_raw_os_error(source as i32),
        }),
    }
}

fn build_argv(spec: &CommandSpec) -> Result<Vec<CString>> {
    let mut argv = Vec::with_capacity(spec.args.len() + 1);
    for word in std::iter::once(&spec.program).chain(spec.args.iter()) {
        let arg = CString::new(word.as_str())
            .map_err(|_| UschedError::InvalidCommand(spec.line.clone()))?;
        argv.push(arg);
    }
    Ok(argv)
}
