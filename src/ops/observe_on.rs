use std::collections::VecDeque;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Notification, Observer},
  rc::MutArc,
  scheduler::SharedScheduler,
  subscription::Subscription,
};

struct ObserveOnState<T> {
  /// Taken out while a drain delivers.
  observer: Option<BoxObserver<T>>,
  queue: VecDeque<Notification<T>>,
  scheduled: bool,
}

struct ObserveOnObserver<T> {
  state: MutArc<ObserveOnState<T>>,
  target: SharedScheduler,
  subscription: Subscription,
}

fn drain_queue<T>(state: &MutArc<ObserveOnState<T>>) {
  let Some(mut observer) = state.rc_deref_mut().observer.take() else { return };
  loop {
    let notification = {
      let mut state = state.rc_deref_mut();
      match state.queue.pop_front() {
        Some(notification) => notification,
        None => {
          state.observer = Some(observer);
          state.scheduled = false;
          return;
        }
      }
    };
    notification.deliver(&mut observer);
  }
}

impl<T: Value> ObserveOnObserver<T> {
  fn enqueue(&mut self, notification: Notification<T>) {
    let schedule = {
      let mut state = self.state.rc_deref_mut();
      state.queue.push_back(notification);
      !std::mem::replace(&mut state.scheduled, true)
    };
    if schedule {
      let state = self.state.clone();
      self.target.run_now(&self.subscription, move || drain_queue(&state));
    }
  }
}

impl<T: Value> Observer<T> for ObserveOnObserver<T> {
  fn next(&mut self, value: T) { self.enqueue(Notification::Next(value)) }

  fn error(&mut self, err: RxError) { self.enqueue(Notification::Error(err)) }

  fn complete(&mut self) { self.enqueue(Notification::Complete) }
}

impl<T: Value> Observable<T> {
  /// Re-deliver every notification on `target`, in order. The source keeps
  /// running on the subscribing scheduler.
  pub fn observe_on(&self, target: SharedScheduler) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let observe_on = ObserveOnObserver {
        state: MutArc::own(ObserveOnState { observer: Some(observer), queue: VecDeque::new(), scheduled: false }),
        target: target.clone(),
        subscription: subscription.clone(),
      };
      source.actual_subscribe(Box::new(observe_on), scheduler, subscription);
    })
  }
}

#[cfg(test)]
mod tests {
  use std::thread;

  use crate::prelude::*;

  #[test]
  fn delivers_on_target_in_order() {
    let caller = thread::current().id();
    let values = observable::from_iter(0..100)
      .observe_on(SharedScheduler::new_thread())
      .map(move |v| (v, thread::current().id() != caller))
      .to_vec(&SharedScheduler::trampoline())
      .unwrap();
    assert_eq!(values.len(), 100);
    assert!(values.iter().all(|(_, off_caller)| *off_caller));
    assert!(values.windows(2).all(|w| w[0].0 < w[1].0));
  }

  #[test]
  fn queued_target_holds_values_until_drained() {
    let target = SharedScheduler::queued();
    let log = crate::rc::MutArc::own(vec![]);
    let l = log.clone();
    observable::from_iter([1, 2, 3])
      .observe_on(target.clone())
      .subscribe(move |v| l.rc_deref_mut().push(v), &SharedScheduler::trampoline());
    assert!(log.rc_deref().is_empty());
    target.drain();
    assert_eq!(*log.rc_deref(), vec![1, 2, 3]);
  }

  #[test]
  fn downstream_may_feed_the_source() {
    let subject = Subject::new();
    let log = crate::rc::MutArc::own(vec![]);
    let (l, feed) = (log.clone(), subject.clone());
    subject.observable().observe_on(SharedScheduler::immediate()).subscribe(
      move |v: i32| {
        l.rc_deref_mut().push(v);
        if v < 3 {
          feed.next(v + 1);
        }
      },
      &SharedScheduler::immediate(),
    );
    subject.next(1);
    assert_eq!(*log.rc_deref(), vec![1, 2, 3]);
  }
}
