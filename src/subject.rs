//! Subjects: an observer and an observable at once.
//!
//! Values fed into a [`Subject`] are multicast to every observer attached at
//! the moment of the call. The registry is read under the subject's lock and
//! delivery happens outside of it, so observers may subscribe or cancel from
//! inside a callback. An observer that feeds the subject it is attached to
//! from inside its own callback receives the new value once the current
//! callback returns.
//!
//! A replaying subject ([`Subject::replay`]) additionally keeps a bounded,
//! optionally age-limited buffer; a newly attached observer first receives
//! the buffered values that have not expired, in order, then live values.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Notification, Observer},
  subscription::Subscription,
};

mod registry;
mod replay;

use registry::{broadcast_value, Entry, Registry};
pub use replay::{ReplayConfig, DEFAULT_REPLAY_CAPACITY};
use replay::ReplayBuffer;

pub struct Subject<T> {
  core: Arc<Mutex<SubjectState<T>>>,
}

struct SubjectState<T> {
  registry: Registry<T>,
  terminal: Option<Notification<T>>,
  replay: Option<ReplayBuffer<T>>,
}

impl<T> Clone for Subject<T> {
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<T: Value> Default for Subject<T> {
  fn default() -> Self { Self::new() }
}

fn lock<T>(core: &Mutex<SubjectState<T>>) -> MutexGuard<'_, SubjectState<T>> {
  core.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Value> Subject<T> {
  pub fn new() -> Self { Self::with_buffer(None) }

  /// A subject that replays buffered values to late observers.
  pub fn replay(config: ReplayConfig) -> Self { Self::with_buffer(Some(ReplayBuffer::new(config))) }

  fn with_buffer(replay: Option<ReplayBuffer<T>>) -> Self {
    Subject {
      core: Arc::new(Mutex::new(SubjectState { registry: Registry::default(), terminal: None, replay })),
    }
  }

  fn state(&self) -> MutexGuard<'_, SubjectState<T>> { lock(&self.core) }

  pub fn next(&self, value: T) {
    let entries = {
      let mut state = self.state();
      if state.terminal.is_some() {
        return;
      }
      if let Some(buffer) = state.replay.as_mut() {
        buffer.push(value.clone());
      }
      state.registry.snapshot()
    };
    broadcast_value(&entries, value);
  }

  pub fn error(&self, err: RxError) { self.terminate(Notification::Error(err)) }

  pub fn complete(&self) { self.terminate(Notification::Complete) }

  fn terminate(&self, terminal: Notification<T>) {
    let entries = {
      let mut state = self.state();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(terminal.clone());
      state.registry.take_all()
    };
    for entry in entries {
      entry.deliver(terminal.clone());
    }
  }

  /// Number of observers currently attached.
  pub fn observer_count(&self) -> usize { self.state().registry.len() }

  /// Whether the subject has received a terminal signal.
  pub fn is_closed(&self) -> bool { self.state().terminal.is_some() }

  /// The observable surface of this subject.
  pub fn observable(&self) -> Observable<T> {
    let subject = self.clone();
    Observable::new(move |observer, _, subscription| subject.attach(observer, subscription))
  }

  fn attach(&self, observer: BoxObserver<T>, subscription: &Subscription) {
    let mut state = self.state();
    let replayed = state.replay.as_mut().map(ReplayBuffer::snapshot).unwrap_or_default();

    if let Some(terminal) = state.terminal.clone() {
      drop(state);
      let mut observer = observer;
      for value in replayed {
        if subscription.is_canceled() {
          return;
        }
        observer.next(value);
      }
      if !subscription.is_canceled() {
        terminal.deliver(&mut observer);
      }
      return;
    }

    let entry = Entry::new(observer, subscription.clone());
    // Queued before the subject is released so live values line up behind
    // the replayed ones.
    for value in replayed {
      entry.enqueue(Notification::Next(value));
    }
    let id = state.registry.add(entry.clone());
    drop(state);

    let core: Weak<Mutex<SubjectState<T>>> = Arc::downgrade(&self.core);
    subscription.on_cancel(move || {
      if let Some(core) = core.upgrade() {
        lock(&core).registry.remove(id);
      }
    });
    entry.drain();
  }
}

impl<T: Value> Observer<T> for Subject<T> {
  fn next(&mut self, value: T) { Subject::next(self, value) }

  fn error(&mut self, err: RxError) { Subject::error(self, err) }

  fn complete(&mut self) { Subject::complete(self) }
}
