//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  clock::{Clock, SystemClock},
  error::RxError,
  observable::{self, ConnectableObservable, Emitter, Observable, Value},
  observer::{BoxObserver, Notification, Observer, ObserverAll},
  ops::{
    retry::{RetryConfig, RetryPolicy},
    serialize::SerializedObserver,
  },
  scheduler::{
    ImmediateScheduler, QueuedScheduler, Scheduler, SharedScheduler, Task, TaskState,
    TestScheduler, ThreadScheduler, TrampolineScheduler,
  },
  subject::{ReplayConfig, Subject},
  subscription::{Subscription, SubscriptionGuard},
};
