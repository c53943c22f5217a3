//! Round-robin scheduling of externally launched child processes.
//!
//! The dispatcher owns the run queue and time-slices one child at a time:
//!
//! 1. Dequeue the head job and resume its process with `SIGCONT`
//! 2. Arm a fresh quantum timer and wait for it or for the child to exit
//! 3. Stop-and-requeue the survivor, or retire the finished job
//!
//! # Components
//!
//! - [`Job`]: per-command control block (pid, state, granted cpu time)
//! - [`RunQueue`] / [`FifoQueue`]: the fairness order
//! - [`Dispatcher`]: the cycle loop described above
//! - `events` (internal): SIGCHLD draining into per-pid exit records

mod events;

pub mod dispatcher;
pub mod job;
pub mod queue;

pub use dispatcher::{DispatchSummary, Dispatcher};
pub use job::{Job, JobExit, JobState, RetiredJob};
pub use queue::{FifoQueue, RunQueue};
