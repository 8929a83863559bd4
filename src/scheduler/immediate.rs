use std::time::{Duration, Instant};

use super::{Scheduler, Task};
use crate::clock::Clock;

/// Runs every task synchronously inside `schedule`, sleeping the calling
/// thread for delays. Rescheduling nests on the call stack, so deep
/// recursion belongs on the [`TrampolineScheduler`](super::TrampolineScheduler).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Clock for ImmediateScheduler {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }
}

impl Scheduler for ImmediateScheduler {
  fn schedule(&self, mut task: Task, delay: Option<Duration>) {
    if let Some(delay) = delay {
      task.sleep(delay);
    }
    task.run_to_completion();
  }

  #[inline]
  fn drain(&self) {}
}
