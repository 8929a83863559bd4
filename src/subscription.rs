//! Cancellation tree.
//!
//! A [`Subscription`] is a node that is either active or canceled, and only
//! ever moves from active to canceled. Parents own their children; a child
//! never points back at its parent, so canceling a child leaves the parent
//! untouched while canceling the parent reaches every live descendant.

use std::{
  fmt::{Debug, Formatter},
  sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use once_cell::sync::OnceCell;
use smallvec::SmallVec;

type CancelCallback = Box<dyn FnOnce() + Send>;
type DrainFn = Box<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct Subscription(Arc<Node>);

#[derive(Default)]
struct Node {
  state: Mutex<NodeState>,
  canceled: Condvar,
  drain: OnceCell<DrainFn>,
}

#[derive(Default)]
struct NodeState {
  canceled: bool,
  children: SmallVec<[Subscription; 2]>,
  callbacks: SmallVec<[CancelCallback; 1]>,
}

impl Subscription {
  pub fn new() -> Self { Self::default() }

  fn state(&self) -> MutexGuard<'_, NodeState> {
    self.0.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Create a child node. Canceling the child does not affect `self`;
  /// canceling `self` cancels the child. A child created under a canceled
  /// node starts canceled.
  pub fn add_child(&self) -> Subscription {
    let child = Subscription::new();
    let mut state = self.state();
    if state.canceled {
      drop(state);
      child.cancel();
    } else {
      state.children.retain(|c| !c.is_canceled());
      state.children.push(child.clone());
    }
    child
  }

  /// Create a child node that runs `on_cancel` when it is canceled.
  pub fn add_child_with(&self, on_cancel: impl FnOnce() + Send + 'static) -> Subscription {
    let child = self.add_child();
    child.on_cancel(on_cancel);
    child
  }

  /// Register a callback fired exactly once when this node is canceled. If
  /// the node is already canceled the callback runs immediately.
  pub fn on_cancel(&self, callback: impl FnOnce() + Send + 'static) {
    let mut state = self.state();
    if state.canceled {
      drop(state);
      callback();
    } else {
      state.callbacks.push(Box::new(callback));
    }
  }

  /// Cancel this node and every live descendant. Idempotent: only the first
  /// call, even among concurrent ones, fires the callbacks.
  pub fn cancel(&self) {
    let (children, callbacks) = {
      let mut state = self.state();
      if state.canceled {
        return;
      }
      state.canceled = true;
      (std::mem::take(&mut state.children), std::mem::take(&mut state.callbacks))
    };
    self.0.canceled.notify_all();
    tracing::trace!(children = children.len(), callbacks = callbacks.len(), "subscription canceled");
    for child in children {
      child.cancel();
    }
    for callback in callbacks {
      callback();
    }
  }

  #[inline]
  pub fn is_canceled(&self) -> bool { self.state().canceled }

  /// Register the function `wait` runs before blocking, typically the drain
  /// of the scheduler that executes this subscription's work. Only the first
  /// registration is kept.
  pub fn on_wait(&self, drain: impl Fn() + Send + Sync + 'static) {
    let _ = self.0.drain.set(Box::new(drain));
  }

  /// Run the registered drain, then block until this node is canceled.
  pub fn wait(&self) {
    if let Some(drain) = self.0.drain.get() {
      drain();
    }
    let mut state = self.state();
    while !state.canceled {
      state = self
        .0
        .canceled
        .wait(state)
        .unwrap_or_else(PoisonError::into_inner);
    }
  }

  /// Block for at most `timeout` or until canceled. Returns whether the node
  /// is canceled. Does not run the drain.
  pub fn wait_timeout(&self, timeout: Duration) -> bool {
    let state = self.state();
    let (state, _) = self
      .0
      .canceled
      .wait_timeout_while(state, timeout, |s| !s.canceled)
      .unwrap_or_else(PoisonError::into_inner);
    state.canceled
  }

  /// Number of children that are still active.
  pub fn child_count(&self) -> usize {
    self
      .state()
      .children
      .iter()
      .filter(|c| !c.is_canceled())
      .count()
  }

  #[inline]
  pub fn is_same(&self, other: &Subscription) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.state();
    f.debug_struct("Subscription")
      .field("canceled", &state.canceled)
      .field("children", &state.children.len())
      .field("callbacks", &state.callbacks.len())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be canceled.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Option<Subscription>);

impl SubscriptionGuard {
  pub fn new(subscription: Subscription) -> SubscriptionGuard { SubscriptionGuard(Some(subscription)) }

  /// Give up the guard without canceling.
  pub fn into_inner(mut self) -> Subscription { self.0.take().unwrap_or_default() }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.cancel()
    }
  }
}

impl Subscription {
  /// Activates "RAII" behavior for this subscription: it is canceled as soon
  /// as the returned guard goes out of scope.
  pub fn cancel_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard::new(self) }
}
