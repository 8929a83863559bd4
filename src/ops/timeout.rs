use std::time::{Duration, Instant};

use crate::{
  clock::Clock,
  error::RxError,
  observable::{Observable, Value},
  observer::{Notification, Observer},
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::{SharedScheduler, TaskState},
  subscription::Subscription,
};

/// Deadline and terminal latch share one lock, so a value racing the
/// deadline check either resets the deadline or loses to the timeout, never
/// both.
struct TimeoutState {
  deadline: Instant,
  occurred: bool,
}

struct TimeoutObserver<T> {
  state: MutArc<TimeoutState>,
  downstream: SerializedObserver<T>,
  clock: SharedScheduler,
  checker: Subscription,
  duration: Duration,
}

impl<T: Send> TimeoutObserver<T> {
  fn terminate(&mut self, terminal: Notification<T>) {
    if std::mem::replace(&mut self.state.rc_deref_mut().occurred, true) {
      return;
    }
    self.downstream.enqueue(terminal);
    self.downstream.drain();
    self.checker.cancel();
  }
}

impl<T: Send> Observer<T> for TimeoutObserver<T> {
  fn next(&mut self, value: T) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.occurred {
        return;
      }
      state.deadline = self.clock.now() + self.duration;
      self.downstream.enqueue(Notification::Next(value));
    }
    self.downstream.drain();
  }

  fn error(&mut self, err: RxError) { self.terminate(Notification::Error(err)) }

  fn complete(&mut self) { self.terminate(Notification::Complete) }
}

impl<T: Value> Observable<T> {
  /// Fail with [`RxError::Timeout`] when `duration` passes without a
  /// notification. Every value resets the deadline.
  pub fn timeout(&self, duration: Duration) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let state = MutArc::own(TimeoutState { deadline: scheduler.now() + duration, occurred: false });
      let downstream = SerializedObserver::new(observer);
      let upstream = subscription.add_child();
      let checker = subscription.add_child();

      let (check_state, clock, upstream_sub) = (state.clone(), scheduler.clone(), upstream.clone());
      let mut timed_out = downstream.clone();
      scheduler.run_after(&checker, duration, move || {
        {
          let mut state = check_state.rc_deref_mut();
          if state.occurred {
            return TaskState::Finished;
          }
          let now = clock.now();
          if now < state.deadline {
            return TaskState::Sleeping(state.deadline - now);
          }
          state.occurred = true;
        }
        tracing::debug!(?duration, "timeout fired");
        timed_out.error(RxError::Timeout(duration));
        upstream_sub.cancel();
        TaskState::Finished
      });

      let timeout = TimeoutObserver { state, downstream, clock: scheduler.clone(), checker, duration };
      source.actual_subscribe(Box::new(timeout), scheduler, &upstream);
    })
  }
}
