use std::{
  collections::VecDeque,
  time::{Duration, Instant},
};

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

struct DelayState<T> {
  queue: VecDeque<(Instant, Notification<T>)>,
  draining: bool,
  done: bool,
}

struct DelayObserver<T> {
  state: MutArc<DelayState<T>>,
  downstream: SerializedObserver<T>,
  scheduler: SharedScheduler,
  subscription: Subscription,
  delay: Duration,
}

/// Deliver every queued notification that is due; sleep until the next one
/// otherwise. A single drainer per subscription keeps the source order.
fn drain_due<T>(
  state: &MutArc<DelayState<T>>, downstream: &SerializedObserver<T>, clock: &SharedScheduler,
) -> TaskState {
  let next = {
    let mut state = state.rc_deref_mut();
    let now = clock.now();
    loop {
      match state.queue.front() {
        None => {
          state.draining = false;
          break TaskState::Finished;
        }
        Some((due, _)) if *due > now => break TaskState::Sleeping(*due - now),
        Some(_) => {}
      }
      if let Some((_, notification)) = state.queue.pop_front() {
        downstream.enqueue(notification);
      }
    }
  };
  downstream.drain();
  next
}

impl<T: Value> DelayObserver<T> {
  fn enqueue(&mut self, notification: Notification<T>) {
    let arm = {
      let mut state = self.state.rc_deref_mut();
      if state.done {
        return;
      }
      if notification.is_terminal() {
        state.done = true;
      }
      let due = self.scheduler.now() + self.delay;
      state.queue.push_back((due, notification));
      !std::mem::replace(&mut state.draining, true)
    };
    if arm {
      let (state, downstream, clock) = (self.state.clone(), self.downstream.clone(), self.scheduler.clone());
      self
        .scheduler
        .run_after(&self.subscription, self.delay, move || drain_due(&state, &downstream, &clock));
    }
  }
}

impl<T: Value> Observer<T> for DelayObserver<T> {
  fn next(&mut self, value: T) { self.enqueue(Notification::Next(value)) }

  fn error(&mut self, err: RxError) {
    {
      let mut state = self.state.rc_deref_mut();
      if std::mem::replace(&mut state.done, true) {
        return;
      }
      state.queue.clear();
    }
    self.downstream.error(err);
  }

  fn complete(&mut self) { self.enqueue(Notification::Complete) }
}

impl<T: Value> Observable<T> {
  /// Shift every value and the completion forward by `delay`, keeping their
  /// order. Errors are delivered right away.
  pub fn delay(&self, delay: Duration) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let delay_observer = DelayObserver {
        state: MutArc::own(DelayState { queue: VecDeque::new(), draining: false, done: false }),
        downstream: SerializedObserver::new(observer),
        scheduler: scheduler.clone(),
        subscription: subscription.clone(),
        delay,
      };
      source.actual_subscribe(Box::new(delay_observer), scheduler, subscription);
    })
  }
}
