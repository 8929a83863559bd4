use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
  observer::{BoxObserver, Notification},
  ops::serialize::SerializedObserver,
  subscription::Subscription,
};

/// One attached observer. The subscription is checked before every delivery
/// so an observer canceled while a broadcast is in flight gets nothing more.
///
/// Delivery goes through a serialized front, so an observer that feeds the
/// subject it is attached to gets the new value after the current one
/// instead of blocking on itself.
pub(crate) struct Entry<T> {
  downstream: SerializedObserver<T>,
  subscription: Subscription,
}

pub(crate) type SharedEntry<T> = Arc<Entry<T>>;

impl<T> Entry<T> {
  pub(crate) fn new(observer: BoxObserver<T>, subscription: Subscription) -> SharedEntry<T> {
    Arc::new(Entry { downstream: SerializedObserver::new(observer), subscription })
  }

  /// Queue a signal behind whatever this entry is delivering.
  pub(crate) fn enqueue(&self, notification: Notification<T>) {
    if !self.subscription.is_canceled() {
      self.downstream.enqueue(notification);
    }
  }

  pub(crate) fn drain(&self) { self.downstream.drain() }

  pub(crate) fn deliver(&self, notification: Notification<T>) {
    self.enqueue(notification);
    self.drain();
  }
}

/// Attached observers keyed by a monotonically increasing id.
pub(crate) struct Registry<T> {
  next_id: usize,
  entries: SmallVec<[(usize, SharedEntry<T>); 2]>,
}

impl<T> Default for Registry<T> {
  fn default() -> Self { Registry { next_id: 0, entries: SmallVec::new() } }
}

impl<T> Registry<T> {
  /// Add an entry and return its id.
  pub(crate) fn add(&mut self, entry: SharedEntry<T>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, entry));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<SharedEntry<T>> {
    let pos = self.entries.iter().position(|(i, _)| *i == id)?;
    Some(self.entries.remove(pos).1)
  }

  pub(crate) fn len(&self) -> usize { self.entries.len() }

  /// The entries attached right now, for delivery outside the registry lock.
  pub(crate) fn snapshot(&self) -> SmallVec<[SharedEntry<T>; 2]> {
    self.entries.iter().map(|(_, e)| e.clone()).collect()
  }

  /// Detach every entry.
  pub(crate) fn take_all(&mut self) -> SmallVec<[SharedEntry<T>; 2]> {
    self.entries.drain(..).map(|(_, e)| e).collect()
  }
}

/// Deliver `value` to every entry, cloning for all but the last one which
/// receives the moved value.
pub(crate) fn broadcast_value<T: Clone>(entries: &[SharedEntry<T>], value: T) {
  let mut iter = entries.iter().peekable();
  while let Some(entry) = iter.next() {
    if iter.peek().is_some() {
      entry.deliver(Notification::Next(value.clone()));
    } else {
      entry.deliver(Notification::Next(value));
      break;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{error::RxError, observer::ObserverAll, rc::MutArc};

  fn recording(log: &MutArc<Vec<i32>>, sub: &Subscription) -> SharedEntry<i32> {
    let l = log.clone();
    Entry::new(Box::new(ObserverAll::new(move |v: i32| l.rc_deref_mut().push(v), |_: RxError| {}, || {})), sub.clone())
  }

  #[test]
  fn ids_are_stable_across_removal() {
    let mut registry = Registry::default();
    let log = MutArc::own(vec![]);
    let sub = Subscription::new();
    let a = registry.add(recording(&log, &sub));
    let b = registry.add(recording(&log, &sub));
    assert!(registry.remove(a).is_some());
    assert!(registry.remove(a).is_none());
    let c = registry.add(recording(&log, &sub));
    assert_ne!(b, c);
    assert_eq!(registry.len(), 2);
  }

  #[test]
  fn broadcast_skips_canceled_entries() {
    let mut registry = Registry::default();
    let log = MutArc::own(vec![]);
    let live = Subscription::new();
    let gone = Subscription::new();
    registry.add(recording(&log, &live));
    registry.add(recording(&log, &gone));
    gone.cancel();
    broadcast_value(&registry.snapshot(), 5);
    assert_eq!(*log.rc_deref(), vec![5]);
  }
}
