use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::Observer,
  ops::serialize::SerializedObserver,
  rc::MutArc,
  subscription::Subscription,
};

struct WithLatestCtx<T, U> {
  latest: MutArc<Option<U>>,
  downstream: SerializedObserver<(T, U)>,
  group: Subscription,
}

impl<T: Send, U: Send> WithLatestCtx<T, U> {
  fn fail(&mut self, err: RxError) {
    if !self.downstream.is_done() {
      self.downstream.error(err);
      self.group.cancel();
    }
  }
}

struct PrimaryObserver<T, U>(WithLatestCtx<T, U>);

impl<T: Send, U: Clone + Send> Observer<T> for PrimaryObserver<T, U> {
  fn next(&mut self, value: T) {
    let latest = self.0.latest.rc_deref().clone();
    if let Some(latest) = latest {
      self.0.downstream.next((value, latest));
    }
  }

  fn error(&mut self, err: RxError) { self.0.fail(err) }

  fn complete(&mut self) {
    if !self.0.downstream.is_done() {
      self.0.downstream.complete();
      self.0.group.cancel();
    }
  }
}

struct SecondaryObserver<T, U>(WithLatestCtx<T, U>);

impl<T: Send, U: Send> Observer<U> for SecondaryObserver<T, U> {
  fn next(&mut self, value: U) { *self.0.latest.rc_deref_mut() = Some(value); }

  fn error(&mut self, err: RxError) { self.0.fail(err) }

  fn complete(&mut self) {}
}

impl<T: Value> Observable<T> {
  /// Pair every value with the latest value of `other`. Values arriving
  /// before `other` has emitted are dropped; the completion of `other` does
  /// not complete the result.
  pub fn with_latest_from<U: Value>(&self, other: Observable<U>) -> Observable<(T, U)> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let group = subscription.add_child();
      let latest = MutArc::own(None);
      let downstream = SerializedObserver::new(observer);
      let secondary =
        WithLatestCtx { latest: latest.clone(), downstream: downstream.clone(), group: group.clone() };
      other.actual_subscribe(Box::new(SecondaryObserver(secondary)), scheduler, &group);
      let primary = WithLatestCtx { latest, downstream, group: group.clone() };
      source.actual_subscribe(Box::new(PrimaryObserver(primary)), scheduler, &group);
    })
  }
}
