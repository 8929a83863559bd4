use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Observer},
  scheduler::SharedScheduler,
  subscription::Subscription,
};

type Fallback<T> = Arc<dyn Fn(RxError) -> Observable<T> + Send + Sync>;

struct CatchObserver<T> {
  observer: Option<BoxObserver<T>>,
  fallback: Fallback<T>,
  scheduler: SharedScheduler,
  parent: Subscription,
  upstream: Subscription,
}

impl<T: Value> Observer<T> for CatchObserver<T> {
  fn next(&mut self, value: T) {
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
    }
  }

  fn error(&mut self, err: RxError) {
    if let Some(observer) = self.observer.take() {
      self.upstream.cancel();
      let replacement = (self.fallback)(err);
      let fallback_sub = self.parent.add_child();
      replacement.actual_subscribe(observer, &self.scheduler, &fallback_sub);
    }
  }

  fn complete(&mut self) {
    if let Some(mut observer) = self.observer.take() {
      observer.complete();
    }
  }
}

impl<T: Value> Observable<T> {
  /// On error, continue with the observable `handler` builds from it.
  pub fn catch_error<F>(&self, handler: F) -> Observable<T>
  where
    F: Fn(RxError) -> Observable<T> + Send + Sync + 'static,
  {
    let source = self.clone();
    let fallback: Fallback<T> = Arc::new(handler);
    Observable::new(move |observer, scheduler, subscription| {
      let upstream = subscription.add_child();
      let catch = CatchObserver {
        observer: Some(observer),
        fallback: fallback.clone(),
        scheduler: scheduler.clone(),
        parent: subscription.clone(),
        upstream: upstream.clone(),
      };
      source.actual_subscribe(Box::new(catch), scheduler, &upstream);
    })
  }

  /// On error, continue with `fallback`.
  pub fn catch(&self, fallback: Observable<T>) -> Observable<T> { self.catch_error(move |_| fallback.clone()) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn substitutes_fallback() {
    let values = observable::from_iter([1, 2])
      .concat_with(observable::throw(RxError::msg("x")))
      .catch(observable::from_iter([8, 9]))
      .to_vec(&SharedScheduler::trampoline());
    assert_eq!(values, Ok(vec![1, 2, 8, 9]));
  }

  #[test]
  fn handler_sees_the_error() {
    let values = observable::throw::<String>(RxError::msg("lost"))
      .catch_error(|err| observable::of(format!("recovered from {err}")))
      .to_vec(&SharedScheduler::trampoline());
    assert_eq!(values, Ok(vec!["recovered from lost".to_string()]));
  }

  #[test]
  fn fallback_errors_propagate() {
    let values = observable::throw::<i32>(RxError::msg("first"))
      .catch(observable::throw(RxError::msg("second")))
      .to_vec(&SharedScheduler::trampoline());
    assert_eq!(values, Err(RxError::msg("second")));
  }
}
