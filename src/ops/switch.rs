//! Switch: follow only the most recent inner observable.
//!
//! Every inner observable is tagged with an id when it arrives. A new inner
//! cancels the previous one, and signals carrying a stale id are dropped, so
//! values still in flight from a replaced inner never reach downstream.

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{Notification, Observer},
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::SharedScheduler,
  subscription::Subscription,
};

struct SwitchState {
  current_id: usize,
  current: Option<Subscription>,
  inner_active: bool,
  outer_done: bool,
  done: bool,
}

struct SwitchInnerObserver<T> {
  state: MutArc<SwitchState>,
  downstream: SerializedObserver<T>,
  group: Subscription,
  id: usize,
}

impl<T: Send> Observer<T> for SwitchInnerObserver<T> {
  fn next(&mut self, value: T) {
    {
      let state = self.state.rc_deref();
      if state.done || state.current_id != self.id {
        return;
      }
      self.downstream.enqueue(Notification::Next(value));
    }
    self.downstream.drain();
  }

  fn error(&mut self, err: RxError) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.done || state.current_id != self.id {
        return;
      }
      state.done = true;
    }
    self.downstream.error(err);
    self.group.cancel();
  }

  fn complete(&mut self) {
    let finished = {
      let mut state = self.state.rc_deref_mut();
      if state.done || state.current_id != self.id {
        return;
      }
      state.inner_active = false;
      state.done = state.outer_done;
      state.done
    };
    if finished {
      self.downstream.complete();
    }
  }
}

struct SwitchOuterObserver<T> {
  state: MutArc<SwitchState>,
  downstream: SerializedObserver<T>,
  group: Subscription,
  scheduler: SharedScheduler,
}

impl<T: Value> Observer<Observable<T>> for SwitchOuterObserver<T> {
  fn next(&mut self, inner: Observable<T>) {
    let inner_sub = self.group.add_child();
    let (id, previous) = {
      let mut state = self.state.rc_deref_mut();
      if state.done {
        inner_sub.cancel();
        return;
      }
      state.current_id += 1;
      state.inner_active = true;
      (state.current_id, state.current.replace(inner_sub.clone()))
    };
    if let Some(previous) = previous {
      previous.cancel();
    }
    let observer = SwitchInnerObserver {
      state: self.state.clone(),
      downstream: self.downstream.clone(),
      group: self.group.clone(),
      id,
    };
    inner.actual_subscribe(Box::new(observer), &self.scheduler, &inner_sub);
  }

  fn error(&mut self, err: RxError) {
    if std::mem::replace(&mut self.state.rc_deref_mut().done, true) {
      return;
    }
    self.downstream.error(err);
    self.group.cancel();
  }

  fn complete(&mut self) {
    let finished = {
      let mut state = self.state.rc_deref_mut();
      state.outer_done = true;
      if state.inner_active || state.done {
        return;
      }
      state.done = true;
      true
    };
    if finished {
      self.downstream.complete();
    }
  }
}

impl<T: Value> Observable<Observable<T>> {
  /// Mirror the latest inner observable, canceling the previous one each
  /// time a new one arrives. Completes when the outer and the last inner
  /// have completed.
  pub fn switch_all(&self) -> Observable<T> {
    let outer = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let group = subscription.add_child();
      let state = MutArc::own(SwitchState {
        current_id: 0,
        current: None,
        inner_active: false,
        outer_done: false,
        done: false,
      });
      let outer_sub = group.add_child();
      let downstream = SerializedObserver::new(observer);
      let switch = SwitchOuterObserver { state, downstream, group, scheduler: scheduler.clone() };
      outer.actual_subscribe(Box::new(switch), scheduler, &outer_sub);
    })
  }
}

impl<T: Value> Observable<T> {
  /// Map every value to an observable and switch to it.
  pub fn switch_map<U, F>(&self, func: F) -> Observable<U>
  where
    U: Value,
    F: Fn(T) -> Observable<U> + Send + Sync + 'static,
  {
    self.map(func).switch_all()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::prelude::*;

  #[test]
  fn replaced_inner_is_canceled() {
    let scheduler = TestScheduler::default();
    let shared = SharedScheduler::from(scheduler.clone());
    // Outer ticks at 0, 25, 50; every inner ticks every 10ms, three times.
    let values = observable::timer_periodic(Duration::ZERO, Duration::from_millis(25))
      .take(3)
      .switch_map(|outer| {
        observable::interval(Duration::from_millis(10))
          .take(3)
          .map(move |inner| outer * 10 + inner)
      })
      .to_vec(&shared);
    assert_eq!(values, Ok(vec![0, 1, 10, 11, 20, 21, 22]));
  }

  #[test]
  fn waits_for_last_inner() {
    let scheduler = TestScheduler::default();
    let values = observable::of(5)
      .switch_map(|v| observable::timer(v, Duration::from_millis(100)))
      .to_vec(&SharedScheduler::from(scheduler.clone()));
    assert_eq!(values, Ok(vec![5]));
    assert_eq!(scheduler.elapsed(), Duration::from_millis(100));
  }

  #[test]
  fn inner_error_terminates() {
    let values = observable::from_iter([1, 2])
      .switch_map(|v| {
        if v == 2 { observable::throw(RxError::msg("bad")) } else { observable::of(v) }
      })
      .to_vec(&SharedScheduler::trampoline());
    assert_eq!(values, Err(RxError::msg("bad")));
  }

  #[test]
  fn downstream_may_push_the_next_outer_value() {
    let outer = Subject::new();
    let log = crate::rc::MutArc::own(vec![]);
    let (l, feed) = (log.clone(), outer.clone());
    outer.observable().switch_map(|v: i32| observable::from_iter([v])).subscribe(
      move |v| {
        l.rc_deref_mut().push(v);
        if v == 1 {
          feed.next(2);
        }
      },
      &SharedScheduler::immediate(),
    );
    outer.next(1);
    assert_eq!(*log.rc_deref(), vec![1, 2]);
  }
}
