use std::time::Duration;

use super::{create_future_recursive, Emitter, Observable, Value};

/// Emits `value` once after `delay`, then completes.
pub fn timer<T: Value>(value: T, delay: Duration) -> Observable<T> {
  create_future_recursive(delay, move |emitter: &Emitter<T>| {
    emitter.next(value.clone());
    emitter.complete();
    Duration::ZERO
  })
}

/// Emits `0` after `initial`, then `1, 2, ...` every `period`.
pub fn timer_periodic(initial: Duration, period: Duration) -> Observable<usize> {
  create_future_recursive(initial, move |emitter: &Emitter<usize>| {
    emitter.next(emitter.index());
    period
  })
}
