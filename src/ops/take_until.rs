use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{Notification, Observer},
  ops::serialize::SerializedObserver,
  subscription::Subscription,
};

struct SourceObserver<T> {
  downstream: SerializedObserver<T>,
  group: Subscription,
}

impl<T: Send> SourceObserver<T> {
  fn terminate(&self, terminal: Notification<T>) {
    if self.downstream.enqueue(terminal) {
      self.downstream.drain();
      self.group.cancel();
    }
  }
}

impl<T: Send> Observer<T> for SourceObserver<T> {
  fn next(&mut self, value: T) { self.downstream.next(value) }

  fn error(&mut self, err: RxError) { self.terminate(Notification::Error(err)) }

  fn complete(&mut self) { self.terminate(Notification::Complete) }
}

struct NotifierObserver<T>(SourceObserver<T>);

impl<T: Send, N> Observer<N> for NotifierObserver<T> {
  fn next(&mut self, _: N) { self.0.terminate(Notification::Complete) }

  fn error(&mut self, err: RxError) { self.0.terminate(Notification::Error(err)) }

  fn complete(&mut self) {}
}

impl<T: Value> Observable<T> {
  /// Mirror this observable until `notifier` emits, then complete.
  pub fn take_until<N: Value>(&self, notifier: Observable<N>) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let group = subscription.add_child();
      let downstream = SerializedObserver::new(observer);
      let notify = NotifierObserver(SourceObserver { downstream: downstream.clone(), group: group.clone() });
      notifier.actual_subscribe(Box::new(notify), scheduler, &group);
      source.actual_subscribe(Box::new(SourceObserver { downstream, group: group.clone() }), scheduler, &group);
    })
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::prelude::*;

  #[test]
  fn stops_when_notifier_fires() {
    let scheduler = TestScheduler::default();
    let values = observable::interval(Duration::from_millis(10))
      .take_until(observable::timer((), Duration::from_millis(35)))
      .to_vec(&SharedScheduler::from(scheduler.clone()));
    assert_eq!(values, Ok(vec![0, 1, 2]));
    assert_eq!(scheduler.elapsed(), Duration::from_millis(35));
  }

  #[test]
  fn downstream_may_fire_the_notifier() {
    let (source, stop) = (Subject::new(), Subject::new());
    let log = crate::rc::MutArc::own(vec![]);
    let (n, c, trigger) = (log.clone(), log.clone(), stop.clone());
    source.observable().take_until(stop.observable()).subscribe_all(
      move |v: i32| {
        n.rc_deref_mut().push(format!("{v}"));
        trigger.next(());
      },
      |_| {},
      move || c.rc_deref_mut().push("complete".to_string()),
      &SharedScheduler::immediate(),
    );
    source.next(1);
    source.next(2);
    assert_eq!(*log.rc_deref(), vec!["1", "complete"]);
  }
}
