//! Test Scheduler for deterministic testing of time-based operators.
//!
//! Provides virtual time that only advances when explicitly instructed,
//! enabling deterministic testing of `delay`, `debounce`, `interval`, etc.
//!
//! Every task, including the ones scheduled without delay, waits in the queue
//! until the test moves time with [`TestScheduler::advance_by`] or runs
//! everything with [`TestScheduler::flush`]. Clones share one clock and one
//! queue, so a test creates a scheduler, hands clones to the pipeline and
//! drives time from the original.
//!
//! ```rust
//! use std::time::Duration;
//! use rxkit::prelude::*;
//!
//! let scheduler = TestScheduler::default();
//! let shared = SharedScheduler::from(scheduler.clone());
//! let out = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
//! let o = out.clone();
//! observable::timer(42, Duration::from_millis(100)).subscribe(move |v| o.lock().unwrap().push(v), &shared);
//!
//! scheduler.advance_by(Duration::from_millis(99));
//! assert!(out.lock().unwrap().is_empty());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert_eq!(*out.lock().unwrap(), vec![42]);
//! ```

use std::time::{Duration, Instant};

use super::{queue::TaskQueue, Scheduler, Task, TaskState};
use crate::{clock::Clock, rc::MutArc};

struct TestSchedulerState {
  virtual_time: Duration,
  queue: TaskQueue,
}

/// A virtual time scheduler for deterministic testing.
#[derive(Clone)]
pub struct TestScheduler {
  origin: Instant,
  state: MutArc<TestSchedulerState>,
}

impl Default for TestScheduler {
  fn default() -> Self {
    TestScheduler {
      origin: Instant::now(),
      state: MutArc::own(TestSchedulerState { virtual_time: Duration::ZERO, queue: TaskQueue::default() }),
    }
  }
}

impl TestScheduler {
  /// Virtual time elapsed since the scheduler was created.
  pub fn elapsed(&self) -> Duration { self.state.rc_deref().virtual_time }

  /// Get the number of pending tasks in the queue.
  pub fn pending_count(&self) -> usize { self.state.rc_deref().queue.len() }

  pub fn is_empty(&self) -> bool { self.state.rc_deref().queue.is_empty() }

  /// Advance virtual time by `duration`, running every task that falls due
  /// on the way in due order, FIFO among equal due times.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.elapsed() + duration;
    self.execute_tasks_until(Some(target));
    let mut state = self.state.rc_deref_mut();
    state.virtual_time = state.virtual_time.max(target);
  }

  /// Run every pending task, jumping time forward to each task's due time.
  ///
  /// Tasks that keep rescheduling themselves run until they finish or are
  /// canceled, so flushing an endless interval never returns.
  pub fn flush(&self) { self.execute_tasks_until(None); }

  fn execute_tasks_until(&self, limit: Option<Duration>) {
    loop {
      let next = {
        let mut state = self.state.rc_deref_mut();
        let due = match state.queue.peek_due() {
          Some(due) => due,
          None => return,
        };
        let offset = due.saturating_duration_since(self.origin);
        if limit.map_or(false, |limit| offset > limit) {
          return;
        }
        let (_, task) = match state.queue.pop() {
          Some(next) => next,
          None => return,
        };
        if task.is_canceled() {
          continue;
        }
        state.virtual_time = state.virtual_time.max(offset);
        task
      };
      let mut task = next;
      let reschedule = match task.step() {
        TaskState::Finished => None,
        TaskState::Yield => Some(Duration::ZERO),
        TaskState::Sleeping(delay) => Some(delay),
      };
      if let Some(delay) = reschedule {
        let due = self.now() + delay;
        self.state.rc_deref_mut().queue.push(due, task);
      }
    }
  }
}

impl Clock for TestScheduler {
  fn now(&self) -> Instant { self.origin + self.elapsed() }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) {
    let due = self.now() + delay.unwrap_or(Duration::ZERO);
    self.state.rc_deref_mut().queue.push(due, task);
  }

  fn drain(&self) { self.flush() }
}
