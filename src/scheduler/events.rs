//! Child-status notifications for the dispatcher.
//!
//! SIGCHLD deliveries coalesce: one wakeup can stand for any number of
//! status changes, so every drain loops `waitpid(-1, WNOHANG)` until the
//! kernel has nothing left to report. Exit statuses are parked in a map
//! keyed by pid; the dispatcher consumes them with [`ChildEvents::take_exit`].
//! Nothing here touches the run queue; all queue mutation stays in the
//! dispatch loop.

use std::collections::HashMap;
use std::io;

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tokio::signal::unix::{signal, SignalKind};

use super::job::JobExit;

pub(crate) struct ChildEvents {
    sigchld: tokio::signal::unix::Signal,
    reaped: HashMap<Pid, JobExit>,
}

impl ChildEvents {
    pub(crate) fn new() -> io::Result<Self> {
        Ok(Self {
            sigchld: signal(SignalKind::child())?,
            reaped: HashMap::new(),
        })
    }

    /// Wait until at least one child-status change has been signalled, then
    /// drain everything reportable. Wakeups for stop/continue transitions
    /// leave the map untouched; callers just wait again.
    pub(crate) async fn changed(&mut self) {
        self.sigchld.recv().await;
        self.drain();
    }

    /// Non-blocking sweep of everything currently reportable.
    pub(crate) fn poll(&mut self) {
        self.drain();
    }

    /// Consume the recorded exit for `pid`, if its process has terminated.
    pub(crate) fn take_exit(&mut self, pid: Pid) -> Option<JobExit> {
        self.reaped.remove(&pid)
    }

    fn drain(&mut self) {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(pid, code)) => {
                    self.reaped.insert(pid, JobExit::Code(code));
                }
                Ok(WaitStatus::Signaled(pid, sig, _)) => {
                    self.reaped.insert(pid, JobExit::Signaled(sig));
                }
                Ok(WaitStatus::StillAlive) => break,
                // Stop/continue reports are not requested and ptrace is not
                // in use; skip anything else the kernel hands back.
                Ok(_) => continue,
                Err(Errno::ECHILD) => break,
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    tracing::error!(error = %err, "waitpid failed while draining child statuses");
                    break;
                }
            }
        }
    }
}
