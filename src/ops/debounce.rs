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

struct DebounceState<T> {
  pending: Option<T>,
  deadline: Instant,
  timer_armed: bool,
  done: bool,
}

struct DebounceObserver<T> {
  state: MutArc<DebounceState<T>>,
  downstream: SerializedObserver<T>,
  scheduler: SharedScheduler,
  subscription: Subscription,
  window: Duration,
}

/// One timer per quiet period: when it fires early because newer values
/// pushed the deadline out, it sleeps until the new deadline instead of
/// being rescheduled.
fn debounce_task<T>(
  state: &MutArc<DebounceState<T>>, downstream: &SerializedObserver<T>, clock: &SharedScheduler,
) -> TaskState {
  {
    let mut state = state.rc_deref_mut();
    if state.done || state.pending.is_none() {
      state.timer_armed = false;
      return TaskState::Finished;
    }
    let now = clock.now();
    if now < state.deadline {
      return TaskState::Sleeping(state.deadline - now);
    }
    state.timer_armed = false;
    if let Some(value) = state.pending.take() {
      downstream.enqueue(Notification::Next(value));
    }
  }
  downstream.drain();
  TaskState::Finished
}

impl<T: Value> Observer<T> for DebounceObserver<T> {
  fn next(&mut self, value: T) {
    let arm = {
      let mut state = self.state.rc_deref_mut();
      if state.done {
        return;
      }
      state.pending = Some(value);
      state.deadline = self.scheduler.now() + self.window;
      !std::mem::replace(&mut state.timer_armed, true)
    };
    if arm {
      let (state, downstream, clock) = (self.state.clone(), self.downstream.clone(), self.scheduler.clone());
      self
        .scheduler
        .run_after(&self.subscription, self.window, move || debounce_task(&state, &downstream, &clock));
    }
  }

  fn error(&mut self, err: RxError) {
    {
      let mut state = self.state.rc_deref_mut();
      if std::mem::replace(&mut state.done, true) {
        return;
      }
      state.pending = None;
    }
    self.downstream.error(err);
  }

  fn complete(&mut self) {
    {
      let mut state = self.state.rc_deref_mut();
      if std::mem::replace(&mut state.done, true) {
        return;
      }
      if let Some(value) = state.pending.take() {
        self.downstream.enqueue(Notification::Next(value));
      }
      self.downstream.enqueue(Notification::Complete);
    }
    self.downstream.drain();
  }
}

impl<T: Value> Observable<T> {
  /// Emit a value only after `window` has passed without a newer one. A
  /// pending value is flushed when the source completes.
  pub fn debounce(&self, window: Duration) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let debounce = DebounceObserver {
        state: MutArc::own(DebounceState {
          pending: None,
          deadline: scheduler.now(),
          timer_armed: false,
          done: false,
        }),
        downstream: SerializedObserver::new(observer),
        scheduler: scheduler.clone(),
        subscription: subscription.clone(),
        window,
      };
      source.actual_subscribe(Box::new(debounce), scheduler, subscription);
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::prelude::*;

  /// Emits each `(at_ms, value)` at its virtual time, then completes.
  fn timed(points: Vec<(u64, i32)>) -> Observable<i32> {
    let points = Arc::new(points);
    observable::create_future_recursive(Duration::from_millis(points[0].0), move |e: &Emitter<i32>| {
      let i = e.index();
      e.next(points[i].1);
      match points.get(i + 1) {
        Some((at, _)) => Duration::from_millis(at - points[i].0),
        None => {
          e.complete();
          Duration::ZERO
        }
      }
    })
  }

  #[test]
  fn emits_after_quiet_window() {
    let scheduler = TestScheduler::default();
    let log = MutArc::own(vec![]);
    let (l, clock) = (log.clone(), scheduler.clone());
    timed(vec![(100, 1), (400, 2), (480, 3), (590, 4)])
      .debounce(Duration::from_millis(100))
      .subscribe(
        move |v| l.rc_deref_mut().push((v, clock.elapsed().as_millis())),
        &SharedScheduler::from(scheduler.clone()),
      );
    scheduler.flush();
    // 4 is flushed by the completion at 590.
    assert_eq!(*log.rc_deref(), vec![(1, 200), (3, 580), (4, 590)]);
  }

  #[test]
  fn trailing_value_after_quiet_period() {
    let scheduler = TestScheduler::default();
    let shared = SharedScheduler::from(scheduler.clone());
    let subject = Subject::new();
    let log = MutArc::own(vec![]);
    let l = log.clone();
    subject.observable().debounce(Duration::from_millis(30)).subscribe(move |v| l.rc_deref_mut().push(v), &shared);
    subject.next(1);
    scheduler.advance_by(Duration::from_millis(20));
    subject.next(2);
    scheduler.advance_by(Duration::from_millis(29));
    assert!(log.rc_deref().is_empty());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(*log.rc_deref(), vec![2]);
  }

  #[test]
  fn downstream_may_feed_the_source() {
    let scheduler = TestScheduler::default();
    let subject = Subject::new();
    let log = MutArc::own(vec![]);
    let (l, feed) = (log.clone(), subject.clone());
    subject.observable().debounce(Duration::from_millis(10)).subscribe(
      move |v: i32| {
        l.rc_deref_mut().push(v);
        if v == 1 {
          feed.next(2);
        }
      },
      &SharedScheduler::from(scheduler.clone()),
    );
    subject.next(1);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*log.rc_deref(), vec![1]);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*log.rc_deref(), vec![1, 2]);
  }
}
