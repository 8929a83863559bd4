use crate::observable::{concat, from_iter, Observable, Value};

impl<T: Value> Observable<T> {
  /// Emit `values` before the values of this observable.
  pub fn start_with(&self, values: Vec<T>) -> Observable<T> { concat([from_iter(values), self.clone()]) }
}
