use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
};

struct FilterObserver<T, F> {
  observer: BoxObserver<T>,
  predicate: Arc<F>,
}

impl<T, F> Observer<T> for FilterObserver<T, F>
where
  F: Fn(&T) -> bool + Send + Sync,
{
  fn next(&mut self, value: T) {
    if (self.predicate)(&value) {
      self.observer.next(value)
    }
  }

  #[inline]
  fn error(&mut self, err: RxError) { self.observer.error(err) }

  #[inline]
  fn complete(&mut self) { self.observer.complete() }
}

impl<T: Value> Observable<T> {
  /// Emit only the values for which `predicate` returns true.
  pub fn filter<F>(&self, predicate: F) -> Observable<T>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    let predicate = Arc::new(predicate);
    self.lift(move |observer, _| Box::new(FilterObserver { observer, predicate: predicate.clone() }))
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn keeps_matching_values() {
    let values = observable::from_iter(0..10)
      .filter(|v| v % 3 == 0)
      .to_vec(&SharedScheduler::trampoline());
    assert_eq!(values, Ok(vec![0, 3, 6, 9]));
  }
}
