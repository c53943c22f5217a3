//! The dispatch loop: round-robin, one quantum per turn.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::waitpid;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, UschedError};
use crate::scheduler::events::ChildEvents;
use crate::scheduler::job::{Job, JobExit, RetiredJob};
use crate::scheduler::queue::{FifoQueue, RunQueue};

/// End-of-run accounting: every retired job in retirement order, plus the
/// total number of dispatch cycles.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub cycles: u64,
    pub retired: Vec<RetiredJob>,
}

impl DispatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.retired.iter().all(|job| job.exit.success())
    }
}

enum CycleOutcome {
    Preempted,
    Finished(JobExit),
    Interrupted,
}

/// Single-controller round-robin dispatcher.
///
/// One job is active at a time. Each cycle resumes the head of the run
/// queue with `SIGCONT`, arms a fresh quantum timer, and waits for whichever
/// comes first: the child terminating or the quantum elapsing. A job that
/// survives its quantum is stopped with `SIGSTOP`, charged the quantum, and
/// re-enqueued at the tail; a terminated job is retired. The loop ends when
/// the queue is empty.
///
/// A child that exits at the same instant its quantum expires is retired
/// only if its exit notification was observable by then; otherwise it is
/// stopped as a zombie, charged, and retired on its next turn. Which side
/// wins depends on OS notification timing and is inherently racy.
pub struct Dispatcher<Q = FifoQueue<Job>>
where
    Q: RunQueue<Job>,
{
    quantum: Duration,
    shutdown: CancellationToken,
    events: ChildEvents,
    queue: Q,
}

impl Dispatcher<FifoQueue<Job>> {
    pub fn new(quantum: Duration, shutdown: CancellationToken) -> Result<Self> {
        Self::with_queue(quantum, shutdown, FifoQueue::new())
    }
}

impl<Q: RunQueue<Job>> Dispatcher<Q> {
    pub fn with_queue(quantum: Duration, shutdown: CancellationToken, queue: Q) -> Result<Self> {
        Ok(Self {
            quantum,
            shutdown,
            events: ChildEvents::new()?,
            queue,
        })
    }

    /// Dispatch until every job has terminated. Jobs are admitted in the
    /// order given, which fixes their round-robin rotation slot.
    pub async fn run(mut self, jobs: Vec<Job>) -> Result<DispatchSummary> {
        for job in jobs {
            tracing::debug!(pid = %job.pid(), command = job.command(), "job admitted");
            self.queue.enqueue(job);
        }

        let mut summary = DispatchSummary::default();
        while let Some(mut job) = self.queue.dequeue() {
            summary.cycles += 1;
            match self.dispatch(&mut job).await? {
                CycleOutcome::Preempted => {
                    tracing::debug!(
                        pid = %job.pid(),
                        quanta = job.quanta(),
                        cpu_ms = job.cpu_time().as_millis() as u64,
                        "quantum expired, job re-queued"
                    );
                    job.admit();
                    self.queue.enqueue(job);
                }
                CycleOutcome::Finished(exit) => {
                    tracing::info!(
                        pid = %job.pid(),
                        command = job.command(),
                        %exit,
                        quanta = job.quanta(),
                        cpu_ms = job.cpu_time().as_millis() as u64,
                        "job finished"
                    );
                    summary.retired.push(job.retire(exit));
                }
                CycleOutcome::Interrupted => {
                    tracing::warn!("shutdown requested, killing outstanding jobs");
                    self.teardown(job);
                    return Err(UschedError::Interrupted);
                }
            }
        }

        tracing::debug!(
            jobs = summary.retired.len(),
            cycles = summary.cycles,
            "run queue empty"
        );
        Ok(summary)
    }

    /// One dispatch cycle for `job`. The quantum timer is armed fresh here,
    /// so an expiration left over from an earlier cycle cannot leak in.
    async fn dispatch(&mut self, job: &mut Job) -> Result<CycleOutcome> {
        // A queued child can be killed out from under us between cycles.
        self.events.poll();
        if let Some(exit) = self.events.take_exit(job.pid()) {
            return Ok(CycleOutcome::Finished(exit));
        }

        self.resume(job)?;
        let quantum = tokio::time::sleep(self.quantum);
        tokio::pin!(quantum);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Ok(CycleOutcome::Interrupted),
                _ = self.events.changed() => {
                    if let Some(exit) = self.events.take_exit(job.pid()) {
                        return Ok(CycleOutcome::Finished(exit));
                    }
                    // Some other child changed state; keep waiting.
                }
                _ = &mut quantum => {
                    // One non-blocking check decides the cycle. An exit that
                    // is already reportable wins over preemption.
                    self.events.poll();
                    return match self.events.take_exit(job.pid()) {
                        Some(exit) => Ok(CycleOutcome::Finished(exit)),
                        None => {
                            self.preempt(job)?;
                            Ok(CycleOutcome::Preempted)
                        }
                    };
                }
            }
        }
    }

    fn resume(&mut self, job: &mut Job) -> Result<()> {
        signal_job(job.pid().as_raw(), Signal::SIGCONT)?;
        job.set_running();
        Ok(())
    }

    fn preempt(&mut self, job: &mut Job) -> Result<()> {
        signal_job(job.pid().as_raw(), Signal::SIGSTOP)?;
        job.suspend(self.quantum);
        Ok(())
    }

    /// Kill and reap the active job and everything still queued. Stopped
    /// processes die to SIGKILL without needing a SIGCONT first.
    fn teardown(&mut self, current: Job) {
        let mut doomed = vec![current];
        while let Some(job) = self.queue.dequeue() {
            doomed.push(job);
        }

        for job in &doomed {
            match kill(job.pid(), Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(err) => {
                    tracing::warn!(pid = %job.pid(), error = %err, "failed to kill job");
                }
            }
        }
        for job in &doomed {
            match waitpid(job.pid(), None) {
                Ok(_) | Err(Errno::ECHILD) => {
                    tracing::info!(pid = %job.pid(), command = job.command(), "job killed");
                }
                Err(err) => {
                    tracing::warn!(pid = %job.pid(), error = %err, "failed to reap killed job");
                }
            }
        }
    }
}

fn signal_job(pid: i32, sig: Signal) -> Result<()> {
    kill(nix::unistd::Pid::from_raw(pid), sig).map_err(|source| UschedError::Signal { pid, source })
}
