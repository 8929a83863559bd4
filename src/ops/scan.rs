use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
};

struct ScanObserver<A, F> {
  observer: BoxObserver<A>,
  acc: A,
  func: Arc<F>,
}

impl<T, A, F> Observer<T> for ScanObserver<A, F>
where
  A: Clone + Send,
  F: Fn(A, T) -> A + Send + Sync,
{
  fn next(&mut self, value: T) {
    self.acc = (self.func)(self.acc.clone(), value);
    self.observer.next(self.acc.clone());
  }

  #[inline]
  fn error(&mut self, err: RxError) { self.observer.error(err) }

  #[inline]
  fn complete(&mut self) { self.observer.complete() }
}

impl<T: Value> Observable<T> {
  /// Emit every intermediate accumulation of `func`, starting from
  /// `initial`.
  pub fn scan<A, F>(&self, initial: A, func: F) -> Observable<A>
  where
    A: Value,
    F: Fn(A, T) -> A + Send + Sync + 'static,
  {
    let func = Arc::new(func);
    self.lift(move |observer, _| Box::new(ScanObserver { observer, acc: initial.clone(), func: func.clone() }))
  }
}
