use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use super::{
  queue::{run_loop, TaskLoop},
  Scheduler, Task,
};
use crate::clock::Clock;

/// Single-thread trampoline.
///
/// The first `schedule` call runs the task synchronously on the calling
/// thread. Anything scheduled while that loop is running, including a task
/// rescheduling itself, is queued and run after the current step returns.
/// Recursion is flattened into iteration, so resubscribing millions of times
/// does not grow the stack.
///
/// The loop belongs to whichever thread started it; delayed tasks are waited
/// for on that thread. Work scheduled from other threads while the loop runs
/// is picked up by the same loop, in due order: a task pushed with an earlier
/// due time wakes the loop out of its wait for a later one.
#[derive(Clone, Default)]
pub struct TrampolineScheduler(Arc<TaskLoop>);

impl TrampolineScheduler {
  /// Number of tasks waiting in the queue.
  pub fn pending_count(&self) -> usize { self.0.pending_count() }
}

impl Clock for TrampolineScheduler {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }
}

impl Scheduler for TrampolineScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) {
    let due = Instant::now() + delay.unwrap_or(Duration::ZERO);
    if self.0.push(due, task) {
      tracing::trace!("trampoline loop started");
      run_loop(&self.0);
    }
  }

  fn drain(&self) {
    if self.0.try_claim(true) {
      run_loop(&self.0);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::scheduler::{SharedScheduler, TaskState};
  use crate::subscription::Subscription;

  #[test]
  fn nested_schedules_run_after_current_task() {
    let log = Arc::new(Mutex::new(vec![]));
    let scheduler = SharedScheduler::new(TrampolineScheduler::default());
    let sub = Subscription::new();
    let (l, s, inner_sub) = (log.clone(), scheduler.clone(), sub.clone());
    scheduler.run_now(&sub, move || {
      l.lock().unwrap().push("outer start");
      let l2 = l.clone();
      s.run_now(&inner_sub, move || l2.lock().unwrap().push("inner"));
      l.lock().unwrap().push("outer end");
    });
    assert_eq!(*log.lock().unwrap(), vec!["outer start", "outer end", "inner"]);
  }

  #[test]
  fn recursive_task_iterates_without_nesting() {
    let depth = Arc::new(Mutex::new((0usize, 0usize)));
    let scheduler = TrampolineScheduler::default();
    let d = depth.clone();
    let mut remaining = 100_000;
    scheduler.schedule(
      Task::new(move || {
        let mut d = d.lock().unwrap();
        d.0 += 1;
        d.1 = d.1.max(d.0);
        d.0 -= 1;
        remaining -= 1;
        if remaining == 0 { TaskState::Finished } else { TaskState::Yield }
      }),
      None,
    );
    assert_eq!(depth.lock().unwrap().1, 1);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn delayed_tasks_run_in_due_order() {
    let log = Arc::new(Mutex::new(vec![]));
    let scheduler = SharedScheduler::new(TrampolineScheduler::default());
    let sub = Subscription::new();
    let (l, s, inner) = (log.clone(), scheduler.clone(), sub.clone());
    scheduler.run_now(&sub, move || {
      for (delay, tag) in [(20u64, "b"), (5, "a"), (30, "c")] {
        let l = l.clone();
        let mut once = Some(tag);
        s.run_after(&inner, Duration::from_millis(delay), move || {
          if let Some(tag) = once.take() {
            l.lock().unwrap().push(tag);
          }
          TaskState::Finished
        });
      }
    });
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
  }

  #[test]
  fn canceled_delayed_task_does_not_block() {
    let scheduler = SharedScheduler::new(TrampolineScheduler::default());
    let root = Subscription::new();
    let timer = root.add_child();
    let (s, r, t) = (scheduler.clone(), root.clone(), timer.clone());
    let start = Instant::now();
    scheduler.run_now(&root, move || {
      s.run_after(&t, Duration::from_secs(10), || panic!("canceled timer must not fire"));
      let root = r.clone();
      s.run_after(&r, Duration::from_millis(5), move || {
        root.cancel();
        TaskState::Finished
      });
    });
    assert!(start.elapsed() < Duration::from_secs(5));
  }

  #[test]
  fn earlier_task_from_another_thread_wakes_the_loop() {
    let scheduler = SharedScheduler::new(TrampolineScheduler::default());
    let sub = Subscription::new();
    let ran_at = Arc::new(Mutex::new(None));
    let start = Instant::now();
    let (s, r, inner) = (scheduler.clone(), ran_at.clone(), sub.clone());
    let feeder = std::thread::spawn(move || {
      std::thread::sleep(Duration::from_millis(50));
      s.run_now(&inner, move || *r.lock().unwrap() = Some(start.elapsed()));
    });
    scheduler.run_after(&sub, Duration::from_millis(1500), || TaskState::Finished);
    feeder.join().unwrap();
    let ran_at = ran_at.lock().unwrap().expect("task from the other thread ran");
    assert!(ran_at < Duration::from_millis(1000), "ran after {ran_at:?}");
  }
}
