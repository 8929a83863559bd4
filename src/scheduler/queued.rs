use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use super::{
  queue::{run_loop, TaskLoop},
  Scheduler, Task,
};
use crate::clock::Clock;

/// Accumulates tasks and runs them only when [`drain`](Scheduler::drain) is
/// called, on the draining thread, in due order.
///
/// Scheduling is lock-protected but the policy is meant for a single
/// producing thread: nothing synchronizes the work the drained tasks do.
#[derive(Clone, Default)]
pub struct QueuedScheduler(Arc<TaskLoop>);

impl QueuedScheduler {
  /// Number of tasks waiting for the next drain.
  pub fn pending_count(&self) -> usize { self.0.pending_count() }
}

impl Clock for QueuedScheduler {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }
}

impl Scheduler for QueuedScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) {
    let due = Instant::now() + delay.unwrap_or(Duration::ZERO);
    self.0.enqueue(due, task);
  }

  fn drain(&self) {
    if self.0.try_claim(false) {
      run_loop(&self.0);
    }
  }
}
