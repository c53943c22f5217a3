use std::fmt;
use std::time::Duration;

use nix::sys::signal::Signal;
use nix::unistd::Pid;

/// Lifecycle of a job's control block.
///
/// `Created -> Queued -> Running -> (Suspended -> Queued -> Running)* -> Finished`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Queued,
    Running,
    Suspended,
    Finished,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Created => write!(f, "created"),
            JobState::Queued => write!(f, "queued"),
            JobState::Running => write!(f, "running"),
            JobState::Suspended => write!(f, "suspended"),
            JobState::Finished => write!(f, "finished"),
        }
    }
}

/// How a job's process left the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobExit {
    Code(i32),
    Signaled(Signal),
}

impl JobExit {
    pub fn success(&self) -> bool {
        matches!(self, JobExit::Code(0))
    }
}

impl fmt::Display for JobExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobExit::Code(code) => write!(f, "exit {code}"),
            JobExit::Signaled(sig) => write!(f, "killed by {}", sig.as_str()),
        }
    }
}

/// Control block for one submitted command.
///
/// Ownership follows the run queue: a job is owned by the queue while
/// `Queued` and by the dispatcher while `Running`/`Suspended`, moving on
/// dequeue/enqueue. The OS process itself is the only concurrent actor.
#[derive(Debug)]
pub struct Job {
    pid: Pid,
    command: String,
    state: JobState,
    cpu_time: Duration,
    quanta: u32,
}

impl Job {
    pub(crate) fn new(pid: Pid, command: String) -> Self {
        Self {
            pid,
            command,
            state: JobState::Created,
            cpu_time: Duration::ZERO,
            quanta: 0,
        }
    }

    /// Process identifier, assigned at fork time and immutable afterward.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Quantum time granted so far. Always `quanta x quantum`: only fully
    /// elapsed quanta are charged, never the partial one a job exits in.
    pub fn cpu_time(&self) -> Duration {
        self.cpu_time
    }

    pub fn quanta(&self) -> u32 {
        self.quanta
    }

    pub(crate) fn admit(&mut self) {
        debug_assert!(matches!(
            self.state,
            JobState::Created | JobState::Suspended
        ));
        self.state = JobState::Queued;
    }

    pub(crate) fn set_running(&mut self) {
        self.state = JobState::Running;
    }

    /// Charge one fully elapsed quantum after the process was stopped.
    pub(crate) fn suspend(&mut self, quantum: Duration) {
        self.cpu_time += quantum;
        self.quanta += 1;
        self.state = JobState::Suspended;
    }

    pub(crate) fn retire(mut self, exit: JobExit) -> RetiredJob {
        self.state = JobState::Finished;
        RetiredJob {
            pid: self.pid,
            command: self.command,
            cpu_time: self.cpu_time,
            quanta: self.quanta,
            exit,
        }
    }
}

/// Final accounting for a retired job.
#[derive(Debug)]
pub struct RetiredJob {
    pub pid: Pid,
    pub command: String,
    pub cpu_time: Duration,
    pub quanta: u32,
    pub exit: JobExit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_created_with_no_time() {
        let job = Job::new(Pid::from_raw(42), "sleep 1".to_string());
        assert_eq!(job.state(), JobState::Created);
        assert_eq!(job.cpu_time(), Duration::ZERO);
        assert_eq!(job.quanta(), 0);
        assert_eq!(job.pid(), Pid::from_raw(42));
    }

    #[test]
    fn suspend_charges_exactly_one_quantum() {
        let mut job = Job::new(Pid::from_raw(42), "spin".to_string());
        job.admit();
        job.set_running();
        job.suspend(Duration::from_millis(100));
        assert_eq!(job.state(), JobState::Suspended);
        assert_eq!(job.cpu_time(), Duration::from_millis(100));
        assert_eq!(job.quanta(), 1);

        job.admit();
        job.set_running();
        job.suspend(Duration::from_millis(100));
        assert_eq!(job.cpu_time(), Duration::from_millis(200));
        assert_eq!(job.quanta(), 2);
    }

    #[test]
    fn retire_carries_accounting_over() {
        let mut job = Job::new(Pid::from_raw(7), "work".to_string());
        job.admit();
        job.set_running();
        job.suspend(Duration::from_millis(50));
        let retired = job.retire(JobExit::Code(0));
        assert_eq!(retired.pid, Pid::from_raw(7));
        assert_eq!(retired.cpu_time, Duration::from_millis(50));
        assert_eq!(retired.quanta, 1);
        assert!(retired.exit.success());
    }

    #[test]
    fn exit_display_and_success() {
        assert!(JobExit::Code(0).success());
        assert!(!JobExit::Code(127).success());
        assert!(!JobExit::Signaled(Signal::SIGKILL).success());
        assert_eq!(JobExit::Code(3).to_string(), "exit 3");
        assert_eq!(
            JobExit::Signaled(Signal::SIGTERM).to_string(),
            "killed by SIGTERM"
        );
    }
}
