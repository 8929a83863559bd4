//! Serialized delivery.
//!
//! A [`SerializedObserver`] is a cloneable front for one downstream observer.
//! Calls from any number of clones, on any number of threads, reach the
//! observer one at a time, and nothing reaches it after the first terminal
//! signal.
//!
//! Signals go through a queue. Whoever finds the observer idle becomes the
//! emitter and drains the queue with no lock held, so a downstream callback
//! that feeds the same front again only enqueues and returns; the running
//! drain delivers it next. Operators with their own state lock
//! [`enqueue`](SerializedObserver::enqueue) under that lock, which keeps the
//! order they decided, and [`drain`](SerializedObserver::drain) after
//! releasing it.

use std::collections::VecDeque;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::{BoxObserver, Notification, Observer},
  rc::MutArc,
};

pub struct SerializedObserver<T> {
  inner: MutArc<SerializedState<T>>,
}

struct SerializedState<T> {
  /// `None` while a drain is delivering, and after the terminal went out.
  observer: Option<BoxObserver<T>>,
  queue: VecDeque<Notification<T>>,
  done: bool,
}

impl<T> Clone for SerializedObserver<T> {
  fn clone(&self) -> Self { SerializedObserver { inner: self.inner.clone() } }
}

impl<T> SerializedObserver<T> {
  pub fn new(observer: BoxObserver<T>) -> Self {
    SerializedObserver {
      inner: MutArc::own(SerializedState { observer: Some(observer), queue: VecDeque::new(), done: false }),
    }
  }

  /// Whether a terminal signal was accepted.
  pub fn is_done(&self) -> bool { self.inner.rc_deref().done }

  /// Queue a signal without delivering it. Signals after the first terminal
  /// are dropped. Returns whether the signal was accepted.
  pub fn enqueue(&self, notification: Notification<T>) -> bool {
    let mut state = self.inner.rc_deref_mut();
    if state.done {
      return false;
    }
    state.done = notification.is_terminal();
    state.queue.push_back(notification);
    true
  }

  /// Deliver queued signals, unless another call is already doing so.
  pub fn drain(&self) {
    let mut observer = {
      let mut state = self.inner.rc_deref_mut();
      if state.queue.is_empty() {
        return;
      }
      match state.observer.take() {
        Some(observer) => observer,
        None => return,
      }
    };
    loop {
      let notification = {
        let mut state = self.inner.rc_deref_mut();
        match state.queue.pop_front() {
          Some(notification) => notification,
          None => {
            state.observer = Some(observer);
            return;
          }
        }
      };
      let terminal = notification.is_terminal();
      notification.deliver(&mut observer);
      if terminal {
        return;
      }
    }
  }

  fn push(&self, notification: Notification<T>) {
    if self.enqueue(notification) {
      self.drain();
    }
  }
}

impl<T: Send> Observer<T> for SerializedObserver<T> {
  fn next(&mut self, value: T) { self.push(Notification::Next(value)) }

  fn error(&mut self, err: RxError) { self.push(Notification::Error(err)) }

  fn complete(&mut self) { self.push(Notification::Complete) }
}

impl<T: Value> Observable<T> {
  /// Guarantee the observer contract downstream even if the source calls
  /// from several threads or keeps emitting after a terminal signal.
  pub fn serialize(&self) -> Observable<T> {
    self.lift(|observer, _| Box::new(SerializedObserver::new(observer)))
  }
}
