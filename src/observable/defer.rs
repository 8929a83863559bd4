use super::{create, Emitter, Observable, Value};

/// Calls `factory` on every subscription and subscribes to the observable it
/// returns, so each subscriber gets a fresh source.
pub fn defer<T, F>(factory: F) -> Observable<T>
where
  T: Value,
  F: Fn() -> Observable<T> + Send + Sync + 'static,
{
  Observable::new(move |observer, scheduler, subscription| {
    factory().actual_subscribe(observer, scheduler, subscription)
  })
}

/// Runs `func` on the subscribing scheduler and emits its result.
pub fn start<T, F>(func: F) -> Observable<T>
where
  T: Value,
  F: Fn() -> T + Send + Sync + 'static,
{
  create(move |emitter: Emitter<T>| {
    emitter.next(func());
    emitter.complete();
  })
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::{observable::of, scheduler::SharedScheduler};

  #[test]
  fn factory_runs_per_subscription() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let source = defer(move || of(c.fetch_add(1, Ordering::SeqCst)));
    let scheduler = SharedScheduler::trampoline();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(source.to_vec(&scheduler), Ok(vec![0]));
    assert_eq!(source.to_vec(&scheduler), Ok(vec![1]));
  }

  #[test]
  fn start_is_lazy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let source = start(move || c.fetch_add(1, Ordering::SeqCst) + 10);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(source.to_single(&SharedScheduler::trampoline()), Ok(10));
  }
}
