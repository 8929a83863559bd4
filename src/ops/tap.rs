use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
};

type OnNext<T> = Arc<dyn Fn(&T) + Send + Sync>;
type OnError = Arc<dyn Fn(&RxError) + Send + Sync>;
type OnComplete = Arc<dyn Fn() + Send + Sync>;

/// Side effects observed on the way through, without altering the stream.
struct Tap<T> {
  on_next: Option<OnNext<T>>,
  on_error: Option<OnError>,
  on_complete: Option<OnComplete>,
}

impl<T> Clone for Tap<T> {
  fn clone(&self) -> Self {
    Tap {
      on_next: self.on_next.clone(),
      on_error: self.on_error.clone(),
      on_complete: self.on_complete.clone(),
    }
  }
}

struct TapObserver<T> {
  observer: BoxObserver<T>,
  tap: Tap<T>,
}

impl<T> Observer<T> for TapObserver<T> {
  fn next(&mut self, value: T) {
    if let Some(f) = &self.tap.on_next {
      f(&value);
    }
    self.observer.next(value)
  }

  fn error(&mut self, err: RxError) {
    if let Some(f) = &self.tap.on_error {
      f(&err);
    }
    self.observer.error(err)
  }

  fn complete(&mut self) {
    if let Some(f) = &self.tap.on_complete {
      f();
    }
    self.observer.complete()
  }
}

impl<T: Value> Observable<T> {
  fn tap(&self, tap: Tap<T>) -> Observable<T> {
    self.lift(move |observer, _| Box::new(TapObserver { observer, tap: tap.clone() }))
  }

  /// Call `f` with every value before it is forwarded.
  pub fn do_on_next<F>(&self, f: F) -> Observable<T>
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    self.tap(Tap { on_next: Some(Arc::new(f)), on_error: None, on_complete: None })
  }

  /// Call `f` with the error before it is forwarded.
  pub fn do_on_error<F>(&self, f: F) -> Observable<T>
  where
    F: Fn(&RxError) + Send + Sync + 'static,
  {
    self.tap(Tap { on_next: None, on_error: Some(Arc::new(f)), on_complete: None })
  }

  /// Call `f` before completion is forwarded.
  pub fn do_on_complete<F>(&self, f: F) -> Observable<T>
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.tap(Tap { on_next: None, on_error: None, on_complete: Some(Arc::new(f)) })
  }
}
