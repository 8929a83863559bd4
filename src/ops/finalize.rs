use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
  subscription::Subscription,
};

struct FinalizeObserver<T> {
  observer: BoxObserver<T>,
  scope: Subscription,
}

impl<T> Observer<T> for FinalizeObserver<T> {
  fn next(&mut self, value: T) { self.observer.next(value) }

  fn error(&mut self, err: RxError) {
    self.observer.error(err);
    self.scope.cancel();
  }

  fn complete(&mut self) {
    self.observer.complete();
    self.scope.cancel();
  }
}

impl<T: Value> Observable<T> {
  /// Call `f` exactly once when the stream terminates or the subscription is
  /// canceled, whichever happens first. On termination `f` runs after the
  /// terminal signal was delivered downstream.
  pub fn finalize<F>(&self, f: F) -> Observable<T>
  where
    F: Fn() + Send + Sync + 'static,
  {
    let source = self.clone();
    let f = Arc::new(f);
    Observable::new(move |observer, scheduler, subscription| {
      let f = f.clone();
      let scope = subscription.add_child_with(move || f());
      let observer = FinalizeObserver { observer, scope: scope.clone() };
      source.actual_subscribe(Box::new(observer), scheduler, &scope);
    })
  }
}
