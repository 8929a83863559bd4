use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{Notification, Observer},
  ops::serialize::SerializedObserver,
  rc::MutArc,
  subscription::Subscription,
};

struct CombineLatestState<T> {
  latest: Vec<Option<T>>,
  missing: usize,
  remaining: usize,
  done: bool,
}

struct CombineLatestObserver<T> {
  state: MutArc<CombineLatestState<T>>,
  downstream: SerializedObserver<Vec<T>>,
  group: Subscription,
  index: usize,
}

impl<T: Clone + Send> Observer<T> for CombineLatestObserver<T> {
  fn next(&mut self, value: T) {
    {
      let mut guard = self.state.rc_deref_mut();
      let state = &mut *guard;
      if state.done {
        return;
      }
      if state.latest[self.index].replace(value).is_none() {
        state.missing -= 1;
      }
      if state.missing > 0 {
        return;
      }
      // Queued under the lock to keep combinations in the order they were made.
      let combined = state.latest.iter().flatten().cloned().collect();
      self.downstream.enqueue(Notification::Next(combined));
    }
    self.downstream.drain();
  }

  fn error(&mut self, err: RxError) {
    if std::mem::replace(&mut self.state.rc_deref_mut().done, true) {
      return;
    }
    self.downstream.error(err);
    self.group.cancel();
  }

  fn complete(&mut self) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.done {
        return;
      }
      state.remaining -= 1;
      if state.remaining > 0 {
        return;
      }
      state.done = true;
    }
    self.downstream.complete();
  }
}

/// Emit the latest value of every source, as a vector in source order, each
/// time any source emits once all of them have emitted at least once.
/// Completes when every source has completed.
pub fn combine_latest<T: Value>(sources: impl IntoIterator<Item = Observable<T>>) -> Observable<Vec<T>> {
  let sources: Arc<Vec<_>> = Arc::new(sources.into_iter().collect());
  Observable::new(move |mut observer, scheduler, subscription| {
    if sources.is_empty() {
      observer.complete();
      return;
    }
    let group = subscription.add_child();
    let downstream = SerializedObserver::new(observer);
    let state = MutArc::own(CombineLatestState {
      latest: vec![None; sources.len()],
      missing: sources.len(),
      remaining: sources.len(),
      done: false,
    });
    for (index, source) in sources.iter().enumerate() {
      let observer =
        CombineLatestObserver { state: state.clone(), downstream: downstream.clone(), group: group.clone(), index };
      source.actual_subscribe(Box::new(observer), scheduler, &group);
    }
  })
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::prelude::*;

  #[test]
  fn recombines_on_every_emission() {
    let scheduler = TestScheduler::default();
    let a = observable::interval(Duration::from_millis(10)).take(3);
    let b = observable::timer(100, Duration::from_millis(15));
    let values = combine_latest([a, b]).to_vec(&SharedScheduler::from(scheduler));
    assert_eq!(values, Ok(vec![vec![0, 100], vec![1, 100], vec![2, 100]]));
  }

  #[test]
  fn error_cancels_other_sources() {
    let scheduler = TestScheduler::default();
    let values = combine_latest([observable::interval(Duration::from_millis(10)), observable::throw(RxError::Empty)])
      .to_vec(&SharedScheduler::from(scheduler.clone()));
    assert_eq!(values, Err(RxError::Empty));
    assert_eq!(scheduler.elapsed(), Duration::ZERO);
  }

  #[test]
  fn downstream_may_feed_a_source() {
    let (a, b) = (Subject::new(), Subject::new());
    let log = MutArc::own(vec![]);
    let (l, feed) = (log.clone(), b.clone());
    combine_latest([a.observable(), b.observable()]).subscribe(
      move |v: Vec<i32>| {
        if v == [1, 10] {
          feed.next(20);
        }
        l.rc_deref_mut().push(v);
      },
      &SharedScheduler::immediate(),
    );
    b.next(10);
    a.next(1);
    assert_eq!(*log.rc_deref(), vec![vec![1, 10], vec![1, 20]]);
  }
}
