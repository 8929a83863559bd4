//! Concat: subscribe to sources strictly one after another.
//!
//! The next source is subscribed from a run-now task once the previous one
//! completed, so on the trampoline a long chain advances iteratively instead
//! of nesting. A finished source's subscription is canceled before the next
//! one starts. An error stops the chain.

use std::collections::VecDeque;

use crate::{
  error::RxError,
  observable::{from_iter, Observable, Value},
  observer::Observer,
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::SharedScheduler,
  subscription::Subscription,
};

struct ConcatState<T> {
  queue: VecDeque<Observable<T>>,
  active: bool,
  outer_done: bool,
  done: bool,
}

struct ConcatCtx<T> {
  state: MutArc<ConcatState<T>>,
  downstream: SerializedObserver<T>,
  group: Subscription,
  scheduler: SharedScheduler,
}

impl<T> Clone for ConcatCtx<T> {
  fn clone(&self) -> Self {
    ConcatCtx {
      state: self.state.clone(),
      downstream: self.downstream.clone(),
      group: self.group.clone(),
      scheduler: self.scheduler.clone(),
    }
  }
}

impl<T: Value> ConcatCtx<T> {
  fn subscribe_inner(&self, source: Observable<T>) {
    let inner = self.group.add_child();
    let observer = ConcatInnerObserver { ctx: self.clone(), inner: inner.clone() };
    source.actual_subscribe(Box::new(observer), &self.scheduler, &inner);
  }

  /// Start the next queued source on a fresh task, or complete if nothing
  /// is left and the outer stream is done.
  fn advance(&self) {
    let (next, finished) = {
      let mut state = self.state.rc_deref_mut();
      if state.done {
        return;
      }
      match state.queue.pop_front() {
        Some(next) => (Some(next), false),
        None => {
          state.active = false;
          state.done = state.outer_done;
          (None, state.done)
        }
      }
    };
    if let Some(next) = next {
      let ctx = self.clone();
      self.scheduler.run_now(&self.group, move || ctx.subscribe_inner(next));
    } else if finished {
      self.downstream.clone().complete();
    }
  }

  fn fail(&self, err: RxError) {
    {
      let mut state = self.state.rc_deref_mut();
      if std::mem::replace(&mut state.done, true) {
        return;
      }
      state.queue.clear();
    }
    self.downstream.clone().error(err);
    self.group.cancel();
  }
}

struct ConcatInnerObserver<T> {
  ctx: ConcatCtx<T>,
  inner: Subscription,
}

impl<T: Value> Observer<T> for ConcatInnerObserver<T> {
  fn next(&mut self, value: T) { self.ctx.downstream.next(value) }

  fn error(&mut self, err: RxError) { self.ctx.fail(err) }

  fn complete(&mut self) {
    self.inner.cancel();
    self.ctx.advance();
  }
}

struct ConcatOuterObserver<T> {
  ctx: ConcatCtx<T>,
}

impl<T: Value> Observer<Observable<T>> for ConcatOuterObserver<T> {
  fn next(&mut self, source: Observable<T>) {
    let start = {
      let mut state = self.ctx.state.rc_deref_mut();
      if state.done {
        return;
      }
      if state.active {
        state.queue.push_back(source);
        None
      } else {
        state.active = true;
        Some(source)
      }
    };
    if let Some(source) = start {
      self.ctx.subscribe_inner(source);
    }
  }

  fn error(&mut self, err: RxError) { self.ctx.fail(err) }

  fn complete(&mut self) {
    {
      let mut state = self.ctx.state.rc_deref_mut();
      state.outer_done = true;
      if state.active || state.done {
        return;
      }
      state.done = true;
    }
    self.ctx.downstream.complete();
  }
}

/// Subscribe to `sources` one at a time, in order.
///
/// ```rust
/// use rxkit::prelude::*;
///
/// let values = observable::concat([
///   observable::from_iter([0, 1, 2, 3]),
///   observable::from_iter([4, 5]),
///   observable::of(6),
/// ])
/// .to_vec(&SharedScheduler::trampoline())
/// .unwrap();
/// assert_eq!(values, vec![0, 1, 2, 3, 4, 5, 6]);
/// ```
pub fn concat<T: Value>(sources: impl IntoIterator<Item = Observable<T>>) -> Observable<T> {
  let sources: Vec<_> = sources.into_iter().collect();
  from_iter(sources).concat_all()
}

impl<T: Value> Observable<T> {
  pub fn concat_with(&self, other: Observable<T>) -> Observable<T> { concat([self.clone(), other]) }

  /// Map every value to an observable and concatenate them in order.
  pub fn concat_map<U, F>(&self, func: F) -> Observable<U>
  where
    U: Value,
    F: Fn(T) -> Observable<U> + Send + Sync + 'static,
  {
    self.map(func).concat_all()
  }
}

impl<T: Value> Observable<Observable<T>> {
  /// Subscribe to inner observables one at a time, queueing the ones that
  /// arrive while another is active.
  pub fn concat_all(&self) -> Observable<T> {
    let outer = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let group = subscription.add_child();
      let ctx = ConcatCtx {
        state: MutArc::own(ConcatState {
          queue: VecDeque::new(),
          active: false,
          outer_done: false,
          done: false,
        }),
        downstream: SerializedObserver::new(observer),
        group: group.clone(),
        scheduler: scheduler.clone(),
      };
      let outer_sub = group.add_child();
      outer.actual_subscribe(Box::new(ConcatOuterObserver { ctx }), scheduler, &outer_sub);
    })
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::prelude::*;

  #[test]
  fn strict_order_across_schedulers() {
    let source = observable::concat([
      observable::from_iter([0, 1, 2, 3]),
      observable::from_iter([4, 5]),
      observable::from_iter([6]),
    ]);
    for scheduler in [SharedScheduler::trampoline(), SharedScheduler::immediate(), SharedScheduler::new_thread()] {
      assert_eq!(source.to_vec(&scheduler), Ok(vec![0, 1, 2, 3, 4, 5, 6]));
    }
  }

  #[test]
  fn slow_source_is_not_overtaken() {
    let scheduler = TestScheduler::default();
    let slow = observable::timer(1, Duration::from_millis(50));
    let fast = observable::of(2);
    assert_eq!(
      slow.concat_with(fast).to_vec(&SharedScheduler::from(scheduler)),
      Ok(vec![1, 2])
    );
  }

  #[test]
  fn error_stops_the_chain() {
    let source = observable::concat([
      observable::of(1),
      observable::throw(RxError::msg("stop")),
      observable::of(3),
    ]);
    assert_eq!(source.to_vec(&SharedScheduler::trampoline()), Err(RxError::msg("stop")));
  }

  #[test]
  fn concat_map_keeps_inner_order() {
    let scheduler = TestScheduler::default();
    let values = observable::from_iter([30u64, 10, 20])
      .concat_map(|ms| observable::timer(ms, Duration::from_millis(ms)))
      .to_vec(&SharedScheduler::from(scheduler));
    assert_eq!(values, Ok(vec![30, 10, 20]));
  }

  #[test]
  fn long_chain_does_not_grow_the_stack() {
    let sources: Vec<_> = (0..100_000).map(observable::of).collect();
    let count = observable::concat(sources)
      .to_vec(&SharedScheduler::trampoline())
      .map(|v| v.len());
    assert_eq!(count, Ok(100_000));
  }

  #[test]
  fn downstream_may_feed_the_active_source() {
    let (first, second) = (Subject::new(), Subject::new());
    let log = crate::rc::MutArc::own(vec![]);
    let (l, feed) = (log.clone(), first.clone());
    first.observable().concat_with(second.observable()).subscribe(
      move |v: i32| {
        l.rc_deref_mut().push(v);
        if v == 1 {
          feed.next(2);
          feed.complete();
        }
      },
      &SharedScheduler::immediate(),
    );
    first.next(1);
    second.next(3);
    assert_eq!(*log.rc_deref(), vec![1, 2, 3]);
  }
}
