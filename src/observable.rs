//! Observables: re-invocable producers of values.
//!
//! An [`Observable`] is a plain value wrapping a subscribe function. Calling
//! it with an observer, a scheduler and a subscription begins one independent
//! production; composing operators wraps that function into a new one that
//! installs a transformed observer before calling upstream.
//!
//! ```rust
//! use rxkit::prelude::*;
//!
//! let values = observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .to_vec(&SharedScheduler::trampoline())
//!   .unwrap();
//! assert_eq!(values, vec![0, 4, 8, 12, 16]);
//! ```

use std::{fmt, sync::Arc};

use crate::{observer::BoxObserver, scheduler::SharedScheduler, subscription::Subscription};

mod block;
mod connectable;
mod create;
mod defer;
mod from_iter;
mod interval;
mod subscribe;
mod timer;

pub use connectable::ConnectableObservable;
pub use create::{create, create_future_recursive, create_recursive, Emitter};
pub use defer::{defer, start};
pub use from_iter::{empty, from_iter, never, of, range, throw};
pub use interval::interval;
pub use timer::{timer, timer_periodic};

pub use crate::ops::{
  combine_latest::combine_latest,
  concat::concat,
  merge::{merge, merge_delay_error},
};

/// Bound on every value that flows through an observable.
pub trait Value: Clone + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + Send + Sync + 'static {}

type SubscribeFn<T> = dyn Fn(BoxObserver<T>, &SharedScheduler, &Subscription) + Send + Sync;

pub struct Observable<T> {
  subscribe: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
  fn clone(&self) -> Self { Observable { subscribe: self.subscribe.clone() } }
}

impl<T> fmt::Debug for Observable<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Observable") }
}

impl<T: Value> Observable<T> {
  /// Wrap a subscribe function.
  ///
  /// The function receives the observer to deliver to, the scheduler the
  /// subscription runs on and the subscription node that cancels it. It must
  /// honor the observer contract: at most one terminal signal, nothing after
  /// it, and nothing once the subscription is canceled.
  pub fn new<F>(subscribe: F) -> Self
  where
    F: Fn(BoxObserver<T>, &SharedScheduler, &Subscription) + Send + Sync + 'static,
  {
    Observable { subscribe: Arc::new(subscribe) }
  }

  /// Begin one production. Does nothing if `subscription` is already
  /// canceled.
  pub fn actual_subscribe(
    &self, observer: BoxObserver<T>, scheduler: &SharedScheduler, subscription: &Subscription,
  ) {
    if subscription.is_canceled() {
      return;
    }
    (self.subscribe)(observer, scheduler, subscription)
  }

  /// Build an operator that only replaces the observer on the way up.
  pub(crate) fn lift<U, F>(&self, wrap: F) -> Observable<U>
  where
    U: Value,
    F: Fn(BoxObserver<U>, &Subscription) -> BoxObserver<T> + Send + Sync + 'static,
  {
    let source = self.clone();
    Observable::new(move |observer, scheduler, subscription| {
      source.actual_subscribe(wrap(observer, subscription), scheduler, subscription)
    })
  }
}
