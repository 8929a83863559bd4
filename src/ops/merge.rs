//! Merge: interleave several sources in arrival order.
//!
//! All sources share one subscription group and one serialized downstream.
//! Values from concurrent sources are delivered one at a time, and a
//! downstream callback that feeds one of the sources is not blocked. The
//! first error is forwarded immediately and cancels the group;
//! [`merge_delay_error`] instead keeps delivering and reports the first
//! error once every source has terminated.

use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{Notification, Observer},
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::SharedScheduler,
  subscription::Subscription,
};

struct MergeState {
  remaining: usize,
  done: bool,
  delay_error: bool,
  first_error: Option<RxError>,
}

impl MergeState {
  fn new(remaining: usize, delay_error: bool) -> Self {
    MergeState { remaining, done: false, delay_error, first_error: None }
  }

  /// One source terminated. Returns the terminal to send downstream, if this
  /// was the last source or an error that ends the merge.
  fn source_done<T>(&mut self, err: Option<RxError>) -> Option<Notification<T>> {
    if self.done {
      return None;
    }
    match err {
      Some(err) if !self.delay_error => {
        self.done = true;
        return Some(Notification::Error(err));
      }
      Some(err) => {
        self.first_error.get_or_insert(err);
      }
      None => {}
    }
    self.remaining -= 1;
    if self.remaining > 0 {
      return None;
    }
    self.done = true;
    Some(match self.first_error.take() {
      Some(err) => Notification::Error(err),
      None => Notification::Complete,
    })
  }
}

/// Shared by every source of one merge.
struct MergeCtx<T> {
  state: MutArc<MergeState>,
  downstream: SerializedObserver<T>,
  group: Subscription,
}

impl<T> Clone for MergeCtx<T> {
  fn clone(&self) -> Self {
    MergeCtx { state: self.state.clone(), downstream: self.downstream.clone(), group: self.group.clone() }
  }
}

impl<T> MergeCtx<T> {
  /// Returns whether the merge terminated.
  fn finish(&self, err: Option<RxError>) -> bool {
    let terminal: Option<Notification<T>> = self.state.rc_deref_mut().source_done(err);
    let Some(terminal) = terminal else { return false };
    let is_error = matches!(terminal, Notification::Error(_));
    self.downstream.enqueue(terminal);
    self.downstream.drain();
    if is_error {
      self.group.cancel();
    }
    true
  }
}

struct MergeObserver<T> {
  ctx: MergeCtx<T>,
  /// Own subscription of a dynamically added inner source.
  inner: Option<Subscription>,
}

impl<T> MergeObserver<T> {
  fn finish(&mut self, err: Option<RxError>) {
    let ended = self.ctx.finish(err);
    if let (false, Some(inner)) = (ended, self.inner.take()) {
      inner.cancel();
    }
  }
}

impl<T: Send> Observer<T> for MergeObserver<T> {
  fn next(&mut self, value: T) { self.ctx.downstream.next(value) }

  fn error(&mut self, err: RxError) { self.finish(Some(err)) }

  fn complete(&mut self) { self.finish(None) }
}

fn merge_sources<T: Value>(sources: Vec<Observable<T>>, delay_error: bool) -> Observable<T> {
  let sources = Arc::new(sources);
  Observable::new(move |mut observer, scheduler, subscription| {
    if sources.is_empty() {
      observer.complete();
      return;
    }
    let group = subscription.add_child();
    let ctx = MergeCtx {
      state: MutArc::own(MergeState::new(sources.len(), delay_error)),
      downstream: SerializedObserver::new(observer),
      group: group.clone(),
    };
    for source in sources.iter() {
      let merge = MergeObserver { ctx: ctx.clone(), inner: None };
      source.actual_subscribe(Box::new(merge), scheduler, &group);
    }
  })
}

/// Values of every source in arrival order. Completes when all sources have
/// completed; the first error terminates the merge and cancels the others.
pub fn merge<T: Value>(sources: impl IntoIterator<Item = Observable<T>>) -> Observable<T> {
  merge_sources(sources.into_iter().collect(), false)
}

/// Like [`merge`], but an error does not stop the other sources: the first
/// error seen is emitted once all sources have terminated.
pub fn merge_delay_error<T: Value>(sources: impl IntoIterator<Item = Observable<T>>) -> Observable<T> {
  merge_sources(sources.into_iter().collect(), true)
}

impl<T: Value> Observable<T> {
  pub fn merge_with(&self, other: Observable<T>) -> Observable<T> { merge([self.clone(), other]) }

  /// Map every value to an observable and merge them all.
  pub fn merge_map<U, F>(&self, func: F) -> Observable<U>
  where
    U: Value,
    F: Fn(T) -> Observable<U> + Send + Sync + 'static,
  {
    self.map(func).merge_all()
  }
}

struct OuterMergeObserver<T> {
  ctx: MergeCtx<T>,
  scheduler: SharedScheduler,
}

impl<T: Value> Observer<Observable<T>> for OuterMergeObserver<T> {
  fn next(&mut self, inner: Observable<T>) {
    {
      let mut state = self.ctx.state.rc_deref_mut();
      if state.done {
        return;
      }
      state.remaining += 1;
    }
    let inner_sub = self.ctx.group.add_child();
    let merge = MergeObserver { ctx: self.ctx.clone(), inner: Some(inner_sub.clone()) };
    inner.actual_subscribe(Box::new(merge), &self.scheduler, &inner_sub);
  }

  fn error(&mut self, err: RxError) { self.ctx.finish(Some(err)); }

  fn complete(&mut self) { self.ctx.finish(None); }
}

impl<T: Value> Observable<Observable<T>> {
  /// Subscribe to every inner observable as it arrives and merge their
  /// values. Completes once the outer and every inner have completed.
  pub fn merge_all(&self) -> Observable<T> {
    let outer = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let group = subscription.add_child();
      let ctx = MergeCtx {
        state: MutArc::own(MergeState::new(1, false)),
        downstream: SerializedObserver::new(observer),
        group: group.clone(),
      };
      let merge = OuterMergeObserver { ctx, scheduler: scheduler.clone() };
      outer.actual_subscribe(Box::new(merge), scheduler, &group);
    })
  }
}
