use std::time::Duration;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{Notification, Observer},
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::TaskState,
  subscription::Subscription,
};

struct SampleState<T> {
  latest: Option<T>,
  done: bool,
}

struct SampleObserver<T> {
  state: MutArc<SampleState<T>>,
  downstream: SerializedObserver<T>,
  ticker: Subscription,
}

impl<T: Send> SampleObserver<T> {
  fn terminate(&mut self, terminal: Notification<T>) {
    {
      let mut state = self.state.rc_deref_mut();
      if std::mem::replace(&mut state.done, true) {
        return;
      }
      state.latest = None;
    }
    self.downstream.enqueue(terminal);
    self.downstream.drain();
    self.ticker.cancel();
  }
}

impl<T: Send> Observer<T> for SampleObserver<T> {
  fn next(&mut self, value: T) {
    let mut state = self.state.rc_deref_mut();
    if !state.done {
      state.latest = Some(value);
    }
  }

  fn error(&mut self, err: RxError) { self.terminate(Notification::Error(err)) }

  fn complete(&mut self) { self.terminate(Notification::Complete) }
}

impl<T: Value> Observable<T> {
  /// Every `period`, emit the most recent value received during that
  /// period, if any. Arrivals do not reset the period.
  pub fn sample(&self, period: Duration) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      let state = MutArc::own(SampleState { latest: None, done: false });
      let downstream = SerializedObserver::new(observer);
      let ticker = subscription.add_child();
      let (tick_state, tick_downstream) = (state.clone(), downstream.clone());
      scheduler.run_after(&ticker, period, move || {
        {
          let mut state = tick_state.rc_deref_mut();
          if state.done {
            return TaskState::Finished;
          }
          if let Some(value) = state.latest.take() {
            tick_downstream.enqueue(Notification::Next(value));
          }
        }
        tick_downstream.drain();
        TaskState::Sleeping(period)
      });
      let sample = SampleObserver { state, downstream, ticker };
      source.actual_subscribe(Box::new(sample), scheduler, subscription);
    })
  }
}
