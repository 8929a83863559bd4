use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
};

struct SkipObserver<T> {
  observer: BoxObserver<T>,
  remaining: usize,
}

impl<T> Observer<T> for SkipObserver<T> {
  fn next(&mut self, value: T) {
    if self.remaining == 0 {
      self.observer.next(value);
    } else {
      self.remaining -= 1;
    }
  }

  #[inline]
  fn error(&mut self, err: RxError) { self.observer.error(err) }

  #[inline]
  fn complete(&mut self) { self.observer.complete() }
}

impl<T: Value> Observable<T> {
  /// Ignore the first `count` values.
  pub fn skip(&self, count: usize) -> Observable<T> {
    self.lift(move |observer, _| Box::new(SkipObserver { observer, remaining: count }))
  }
}
