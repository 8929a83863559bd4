use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{Arc, Condvar, Mutex, PoisonError},
  thread,
  time::{Duration, Instant},
};

use super::{Scheduler, Task};
use crate::{clock::Clock, error::RxError};

/// Runs every scheduled task on a freshly spawned thread. Tasks on different
/// threads are not ordered relative to each other; a task that yields or
/// sleeps keeps stepping on its own thread.
///
/// [`drain`](Scheduler::drain) blocks until every task spawned so far has
/// finished.
#[derive(Clone, Default)]
pub struct ThreadScheduler {
  in_flight: Arc<InFlight>,
}

#[derive(Default)]
struct InFlight {
  count: Mutex<usize>,
  idle: Condvar,
}

impl InFlight {
  fn enter(self: &Arc<Self>) -> InFlightGuard {
    *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    InFlightGuard(self.clone())
  }
}

/// Keeps the in-flight count raised for as long as a task is alive, however
/// its thread ends.
struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    let mut count = self
      .0
      .count
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    *count -= 1;
    if *count == 0 {
      self.0.idle.notify_all();
    }
  }
}

impl ThreadScheduler {
  /// Number of tasks currently running or waiting for their delay.
  pub fn in_flight(&self) -> usize {
    *self
      .in_flight
      .count
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }
}

impl Clock for ThreadScheduler {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }
}

impl Scheduler for ThreadScheduler {
  fn schedule(&self, mut task: Task, delay: Option<Duration>) {
    let guard = self.in_flight.enter();
    let spawned = thread::Builder::new()
      .name("rxkit-worker".into())
      .spawn(move || {
        let _guard = guard;
        if let Some(delay) = delay {
          task.sleep(delay);
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| task.run_to_completion())) {
          tracing::error!(error = %RxError::from_panic(payload), "scheduled task panicked");
        }
      });
    if let Err(err) = spawned {
      tracing::error!(%err, "failed to spawn scheduler thread, task dropped");
    }
  }

  fn drain(&self) {
    let count = self
      .in_flight
      .count
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    let _idle = self
      .in_flight
      .idle
      .wait_while(count, |c| *c > 0)
      .unwrap_or_else(PoisonError::into_inner);
  }
}
