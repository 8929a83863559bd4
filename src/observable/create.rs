use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  sync::Arc,
  time::Duration,
};

use super::{Observable, Value};
use crate::{
  error::RxError,
  observer::{BoxObserver, Notification},
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::TaskState,
  subscription::Subscription,
};

/// Feed handle given to producers built with [`create`] and friends.
///
/// Emissions after a terminal signal, or after the subscription is
/// canceled, are dropped. The emitter is cheap to clone and may be moved to
/// another thread.
pub struct Emitter<T> {
  index: MutArc<usize>,
  downstream: SerializedObserver<T>,
  subscription: Subscription,
}

impl<T> Clone for Emitter<T> {
  fn clone(&self) -> Self {
    Emitter { index: self.index.clone(), downstream: self.downstream.clone(), subscription: self.subscription.clone() }
  }
}

impl<T> Emitter<T> {
  pub(crate) fn new(observer: BoxObserver<T>, subscription: Subscription) -> Self {
    Emitter { index: MutArc::own(0), downstream: SerializedObserver::new(observer), subscription }
  }

  pub fn next(&self, value: T) {
    if self.subscription.is_canceled() {
      return;
    }
    {
      let mut index = self.index.rc_deref_mut();
      if self.downstream.enqueue(Notification::Next(value)) {
        *index += 1;
      }
    }
    self.downstream.drain();
  }

  pub fn error(&self, err: RxError) { self.terminate(Notification::Error(err)) }

  pub fn complete(&self) { self.terminate(Notification::Complete) }

  fn terminate(&self, terminal: Notification<T>) {
    if !self.subscription.is_canceled() && self.downstream.enqueue(terminal) {
      self.downstream.drain();
    }
  }

  /// Whether further emissions would be dropped. Producers poll this before
  /// doing work.
  pub fn is_canceled(&self) -> bool {
    self.subscription.is_canceled() || self.downstream.is_done()
  }

  /// Number of values emitted so far.
  pub fn index(&self) -> usize { *self.index.rc_deref() }

  /// The subscription this production runs under.
  pub fn subscription(&self) -> &Subscription { &self.subscription }

  fn panicked(&self, payload: Box<dyn std::any::Any + Send>) {
    let err = RxError::from_panic(payload);
    tracing::error!(error = %err, "producer panicked");
    self.error(err);
  }

  fn run(&self, producer: impl FnOnce(&Self)) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| producer(self))) {
      self.panicked(payload);
    }
  }
}

/// Observable from a producer that runs once per subscription, as a task on
/// the subscribing scheduler.
///
/// ```rust
/// use rxkit::prelude::*;
///
/// let source = observable::create(|emitter: Emitter<i32>| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// });
/// assert_eq!(source.to_vec(&SharedScheduler::trampoline()).unwrap(), vec![1, 2]);
/// ```
///
/// A panic inside the producer is delivered as [`RxError::TaskPanic`].
pub fn create<T, F>(producer: F) -> Observable<T>
where
  T: Value,
  F: Fn(Emitter<T>) + Send + Sync + 'static,
{
  let producer = Arc::new(producer);
  Observable::new(move |observer, scheduler, subscription| {
    let emitter = Emitter::new(observer, subscription.clone());
    let producer = producer.clone();
    scheduler.run_now(subscription, move || emitter.run(|e| producer(e.clone())));
  })
}

/// Observable from a step the scheduler invokes again and again until it
/// emits a terminal signal or the subscription is canceled. Each invocation
/// is one scheduler step, so long productions interleave with other work on
/// the trampoline.
pub fn create_recursive<T, F>(step: F) -> Observable<T>
where
  T: Value,
  F: Fn(&Emitter<T>) + Send + Sync + 'static,
{
  let step = Arc::new(step);
  Observable::new(move |observer, scheduler, subscription| {
    let emitter = Emitter::new(observer, subscription.clone());
    let step = step.clone();
    scheduler.run_recursive(subscription, move || {
      emitter.run(|e| step(e));
      if emitter.is_canceled() { TaskState::Finished } else { TaskState::Yield }
    });
  })
}

/// Like [`create_recursive`], but the first step runs after `initial` and
/// every step returns how long to wait before the next one.
pub fn create_future_recursive<T, F>(initial: Duration, step: F) -> Observable<T>
where
  T: Value,
  F: Fn(&Emitter<T>) -> Duration + Send + Sync + 'static,
{
  let step = Arc::new(step);
  Observable::new(move |observer, scheduler, subscription| {
    let emitter = Emitter::new(observer, subscription.clone());
    let step = step.clone();
    scheduler.run_after(subscription, initial, move || {
      let mut next = Duration::ZERO;
      emitter.run(|e| next = step(e));
      if emitter.is_canceled() { TaskState::Finished } else { TaskState::Sleeping(next) }
    });
  })
}
