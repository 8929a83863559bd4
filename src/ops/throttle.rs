use std::time::{Duration, Instant};

use crate::{
  clock::Clock,
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
  scheduler::SharedScheduler,
};

struct ThrottleObserver<T> {
  observer: BoxObserver<T>,
  clock: SharedScheduler,
  window: Duration,
  silent_until: Option<Instant>,
}

impl<T> Observer<T> for ThrottleObserver<T> {
  fn next(&mut self, value: T) {
    let now = self.clock.now();
    if self.silent_until.map_or(true, |until| now >= until) {
      self.silent_until = Some(now + self.window);
      self.observer.next(value);
    }
  }

  #[inline]
  fn error(&mut self, err: RxError) { self.observer.error(err) }

  #[inline]
  fn complete(&mut self) { self.observer.complete() }
}

impl<T: Value> Observable<T> {
  /// Emit a value, then ignore the source for `window`, then repeat.
  pub fn throttle(&self, window: Duration) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let throttle = ThrottleObserver { observer, clock: scheduler.clone(), window, silent_until: None };
      source.actual_subscribe(Box::new(throttle), scheduler, subscription);
    })
  }
}
