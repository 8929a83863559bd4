use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
  subscription::Subscription,
};

struct TakeObserver<T> {
  observer: BoxObserver<T>,
  remaining: usize,
  upstream: Subscription,
}

impl<T> Observer<T> for TakeObserver<T> {
  fn next(&mut self, value: T) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.observer.next(value);
    if self.remaining == 0 {
      self.observer.complete();
      self.upstream.cancel();
    }
  }

  fn error(&mut self, err: RxError) {
    if self.remaining > 0 {
      self.remaining = 0;
      self.observer.error(err)
    }
  }

  fn complete(&mut self) {
    if self.remaining > 0 {
      self.remaining = 0;
      self.observer.complete()
    }
  }
}

impl<T: Value> Observable<T> {
  /// Emit only the first `count` values, then complete and cancel the
  /// source.
  pub fn take(&self, count: usize) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |mut observer, scheduler, subscription| {
      if count == 0 {
        observer.complete();
        return;
      }
      let upstream = subscription.add_child();
      let take = TakeObserver { observer, remaining: count, upstream: upstream.clone() };
      source.actual_subscribe(Box::new(take), scheduler, &upstream);
    })
  }
}
