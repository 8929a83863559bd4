use super::{create, Emitter, Observable, Value};
use crate::error::RxError;

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error. The
/// iterator is cloned for every subscription, and cancellation is checked
/// before each element.
///
/// ```rust
/// use rxkit::prelude::*;
///
/// let values = observable::from_iter(vec![0, 1, 2, 3])
///   .to_vec(&SharedScheduler::trampoline())
///   .unwrap();
/// assert_eq!(values, vec![0, 1, 2, 3]);
/// ```
pub fn from_iter<I>(iter: I) -> Observable<I::Item>
where
  I: IntoIterator + Clone + Send + Sync + 'static,
  I::Item: Value,
{
  create(move |emitter: Emitter<I::Item>| {
    for value in iter.clone() {
      if emitter.is_canceled() {
        return;
      }
      emitter.next(value);
    }
    emitter.complete();
  })
}

/// A single value, then completion.
pub fn of<T: Value>(value: T) -> Observable<T> { from_iter([value]) }

/// `count` consecutive integers starting at `start`. The sequence ends early
/// at `i64::MAX` rather than wrapping.
pub fn range(start: i64, count: usize) -> Observable<i64> {
  from_iter((0..count).map_while(move |i| i64::try_from(i).ok().and_then(|i| start.checked_add(i))))
}

/// Completes right away without emitting.
pub fn empty<T: Value>() -> Observable<T> { create(|emitter: Emitter<T>| emitter.complete()) }

/// Never emits and never terminates.
pub fn never<T: Value>() -> Observable<T> { Observable::new(|_, _, _| {}) }

/// Terminates right away with `err`.
pub fn throw<T: Value>(err: RxError) -> Observable<T> {
  create(move |emitter: Emitter<T>| emitter.error(err.clone()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scheduler::SharedScheduler;

  #[test]
  fn resubscription_yields_same_values() {
    let source = range(3, 4);
    let scheduler = SharedScheduler::trampoline();
    assert_eq!(source.to_vec(&scheduler), Ok(vec![3, 4, 5, 6]));
    assert_eq!(source.to_vec(&scheduler), Ok(vec![3, 4, 5, 6]));
  }

  #[test]
  fn range_stops_at_the_largest_value() {
    let scheduler = SharedScheduler::trampoline();
    assert_eq!(range(i64::MAX - 1, 5).to_vec(&scheduler), Ok(vec![i64::MAX - 1, i64::MAX]));
    assert_eq!(range(-2, 3).to_vec(&scheduler), Ok(vec![-2, -1, 0]));
    assert_eq!(range(7, 0).to_vec(&scheduler), Ok(vec![]));
  }

  #[test]
  fn trivial_sources() {
    let scheduler = SharedScheduler::immediate();
    assert_eq!(of("x").to_vec(&scheduler), Ok(vec!["x"]));
    assert_eq!(empty::<u8>().to_vec(&scheduler), Ok(vec![]));
    assert_eq!(throw::<u8>(RxError::msg("no")).to_vec(&scheduler), Err(RxError::msg("no")));
  }

  #[test]
  fn take_stops_iteration_early() {
    let source = from_iter(0..);
    assert_eq!(source.take(3).to_vec(&SharedScheduler::trampoline()), Ok(vec![0, 1, 2]));
  }
}
