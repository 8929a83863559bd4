use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
  subscription::Subscription,
};

struct SingleObserver<T> {
  observer: BoxObserver<T>,
  value: Option<T>,
  done: bool,
  upstream: Subscription,
}

impl<T: Send> Observer<T> for SingleObserver<T> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    if self.value.is_some() {
      self.done = true;
      self.value = None;
      self.observer.error(RxError::TooManyValues);
      self.upstream.cancel();
    } else {
      self.value = Some(value);
    }
  }

  fn error(&mut self, err: RxError) {
    if !self.done {
      self.done = true;
      self.observer.error(err);
    }
  }

  fn complete(&mut self) {
    if self.done {
      return;
    }
    self.done = true;
    match self.value.take() {
      Some(value) => {
        self.observer.next(value);
        self.observer.complete();
      }
      None => self.observer.error(RxError::Empty),
    }
  }
}

impl<T: Value> Observable<T> {
  /// Assert the stream emits exactly one value.
  ///
  /// The value is emitted on completion. A second value fails the stream with
  /// [`RxError::TooManyValues`] and cancels the source; completion without a
  /// value fails with [`RxError::Empty`].
  pub fn single(&self) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let upstream = subscription.add_child();
      let single = SingleObserver { observer, value: None, done: false, upstream: upstream.clone() };
      source.actual_subscribe(Box::new(single), scheduler, &upstream);
    })
  }
}
