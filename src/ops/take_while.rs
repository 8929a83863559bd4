use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
  subscription::Subscription,
};

struct TakeWhileObserver<T, F> {
  observer: BoxObserver<T>,
  predicate: Arc<F>,
  upstream: Subscription,
  done: bool,
}

impl<T, F> Observer<T> for TakeWhileObserver<T, F>
where
  F: Fn(&T) -> bool + Send + Sync,
{
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    if (self.predicate)(&value) {
      self.observer.next(value);
    } else {
      self.done = true;
      self.observer.complete();
      self.upstream.cancel();
    }
  }

  fn error(&mut self, err: RxError) {
    if !std::mem::replace(&mut self.done, true) {
      self.observer.error(err)
    }
  }

  fn complete(&mut self) {
    if !std::mem::replace(&mut self.done, true) {
      self.observer.complete()
    }
  }
}

impl<T: Value> Observable<T> {
  /// Emit values while `predicate` holds; complete on the first value that
  /// fails it.
  pub fn take_while<F>(&self, predicate: F) -> Observable<T>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    let source = self.clone();
    let predicate = Arc::new(predicate);
    Observable::new(move |observer, scheduler, subscription| {
      let upstream = subscription.add_child();
      let take_while =
        TakeWhileObserver { observer, predicate: predicate.clone(), upstream: upstream.clone(), done: false };
      source.actual_subscribe(Box::new(take_while), scheduler, &upstream);
    })
  }
}
