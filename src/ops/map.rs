use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
};

struct MapObserver<U, F> {
  observer: BoxObserver<U>,
  func: Arc<F>,
}

impl<T, U, F> Observer<T> for MapObserver<U, F>
where
  F: Fn(T) -> U + Send + Sync,
{
  #[inline]
  fn next(&mut self, value: T) { self.observer.next((self.func)(value)) }

  #[inline]
  fn error(&mut self, err: RxError) { self.observer.error(err) }

  #[inline]
  fn complete(&mut self) { self.observer.complete() }
}

impl<T: Value> Observable<T> {
  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  pub fn map<U, F>(&self, func: F) -> Observable<U>
  where
    U: Value,
    F: Fn(T) -> U + Send + Sync + 'static,
  {
    let func = Arc::new(func);
    self.lift(move |observer, _| Box::new(MapObserver { observer, func: func.clone() }))
  }
}
