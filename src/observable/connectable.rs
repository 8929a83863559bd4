//! ConnectableObservable implementation for multicasting.
//!
//! `ConnectableObservable` bridges a source `Observable` and a `Subject` so a
//! single source execution is shared by many subscribers.
//!
//! - **Not an Observable**: it does not emit upon subscription.
//! - **Connect**: `connect()` subscribes the subject to the source.
//! - **Fork**: `fork()` creates the `Observable` subscribers attach to.
//!
//! ```rust
//! use rxkit::prelude::*;
//!
//! let scheduler = SharedScheduler::trampoline();
//! let connectable = observable::from_iter([1, 2, 3]).publish();
//! let out = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
//! for tag in ["a", "b"] {
//!   let out = out.clone();
//!   connectable.fork().subscribe(move |v| out.lock().unwrap().push((tag, v)), &scheduler);
//! }
//! connectable.connect(&scheduler);
//! assert_eq!(out.lock().unwrap().len(), 6);
//! ```

use super::{Observable, Value};
use crate::{
  rc::MutArc,
  scheduler::SharedScheduler,
  subject::Subject,
  subscription::Subscription,
};

/// It holds a source and a subject. Subscribers listen to the subject,
/// and `connect()` subscribes the subject to the source.
pub struct ConnectableObservable<T> {
  source: Observable<T>,
  subject: Subject<T>,
  connection: MutArc<Option<Subscription>>,
}

impl<T> Clone for ConnectableObservable<T> {
  fn clone(&self) -> Self {
    ConnectableObservable {
      source: self.source.clone(),
      subject: self.subject.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<T: Value> ConnectableObservable<T> {
  pub fn new(source: Observable<T>, subject: Subject<T>) -> Self {
    ConnectableObservable { source, subject, connection: MutArc::own(None) }
  }

  /// An observable attached to the shared subject.
  pub fn fork(&self) -> Observable<T> { self.subject.observable() }

  pub fn subject(&self) -> &Subject<T> { &self.subject }

  /// Subscribe the subject to the source on `scheduler` and return the
  /// controlling subscription.
  ///
  /// While a connection is live, further calls return it unchanged. Once it
  /// has been canceled the next call connects again.
  pub fn connect(&self, scheduler: &SharedScheduler) -> Subscription {
    let connection = {
      let mut slot = self.connection.rc_deref_mut();
      if let Some(live) = slot.as_ref().filter(|c| !c.is_canceled()) {
        return live.clone();
      }
      let connection = Subscription::new();
      *slot = Some(connection.clone());
      connection
    };
    tracing::debug!("connectable connected");
    connection.on_cancel(|| tracing::debug!("connectable disconnected"));
    self.connect_with(scheduler, &connection);
    connection
  }

  /// Subscribe the subject to the source under a connection owned by the
  /// caller.
  pub(crate) fn connect_with(&self, scheduler: &SharedScheduler, connection: &Subscription) {
    self
      .source
      .actual_subscribe(Box::new(self.subject.clone()), scheduler, connection);
  }

  /// Whether a live connection exists.
  pub fn is_connected(&self) -> bool {
    self
      .connection
      .rc_deref()
      .as_ref()
      .map_or(false, |c| !c.is_canceled())
  }
}

impl<T: Value> Observable<T> {
  /// Multicast through a plain subject. Nothing happens until `connect`.
  pub fn publish(&self) -> ConnectableObservable<T> {
    ConnectableObservable::new(self.clone(), Subject::new())
  }

  /// Multicast through a replaying subject.
  pub fn publish_replay(&self, config: crate::subject::ReplayConfig) -> ConnectableObservable<T> {
    ConnectableObservable::new(self.clone(), Subject::replay(config))
  }
}
