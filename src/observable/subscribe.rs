use super::{Observable, Value};
use crate::{
  error::RxError,
  observer::{Observer, ObserverAll},
  scheduler::SharedScheduler,
  subscription::Subscription,
};

/// Outermost observer of a subscription: drops everything after the first
/// terminal signal or once the root is canceled, and cancels the root when
/// the stream terminates so the whole chain is released.
struct ConsumerObserver<O> {
  observer: O,
  root: Subscription,
  done: bool,
}

impl<T, O: Observer<T>> Observer<T> for ConsumerObserver<O> {
  fn next(&mut self, value: T) {
    if !self.done && !self.root.is_canceled() {
      self.observer.next(value);
    }
  }

  fn error(&mut self, err: RxError) {
    if std::mem::replace(&mut self.done, true) {
      return;
    }
    if !self.root.is_canceled() {
      self.observer.error(err);
    }
    self.root.cancel();
  }

  fn complete(&mut self) {
    if std::mem::replace(&mut self.done, true) {
      return;
    }
    if !self.root.is_canceled() {
      self.observer.complete();
    }
    self.root.cancel();
  }
}

impl<T: Value> Observable<T> {
  /// Subscribe `observer` on `scheduler` and return the root subscription.
  ///
  /// The root is canceled once the stream terminates, or earlier by calling
  /// [`Subscription::cancel`]. [`Subscription::wait`] on it drains
  /// `scheduler` and then blocks until it is canceled.
  pub fn subscribe_with<O>(&self, observer: O, scheduler: &SharedScheduler) -> Subscription
  where
    O: Observer<T> + 'static,
  {
    let root = Subscription::new();
    let drain = scheduler.clone();
    root.on_wait(move || drain.drain());
    let consumer = ConsumerObserver { observer, root: root.clone(), done: false };
    self.actual_subscribe(Box::new(consumer), scheduler, &root);
    root
  }

  /// Subscribe with a value callback; errors are logged and dropped.
  pub fn subscribe<N>(&self, next: N, scheduler: &SharedScheduler) -> Subscription
  where
    N: FnMut(T) + Send + 'static,
  {
    self.subscribe_with(
      ObserverAll::new(
        next,
        |err: RxError| tracing::debug!(error = %err, "unhandled error"),
        || {},
      ),
      scheduler,
    )
  }

  pub fn subscribe_all<N, E, C>(
    &self, next: N, error: E, complete: C, scheduler: &SharedScheduler,
  ) -> Subscription
  where
    N: FnMut(T) + Send + 'static,
    E: FnMut(RxError) + Send + 'static,
    C: FnMut() + Send + 'static,
  {
    self.subscribe_with(ObserverAll::new(next, error, complete), scheduler)
  }
}
