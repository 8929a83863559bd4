//! # rxkit: a reactive stream engine
//!
//! Observables are re-invocable producers; operators compose them into
//! pipelines; schedulers decide when and where the work runs; a tree of
//! subscriptions cancels it.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxkit::prelude::*;
//!
//! let scheduler = SharedScheduler::trampoline();
//! let values = observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .to_vec(&scheduler)
//!   .unwrap();
//! assert_eq!(values, vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A subscribe function plus the operator methods |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Node of the cancellation tree |
//! | [`SharedScheduler`] | Handle to the execution policy threaded through a subscription |
//! | [`Subject`] | Multicasts what it is fed, optionally replaying |
//!
//! The scheduler is always passed explicitly when subscribing.
//! `SharedScheduler::default()` is the trampoline.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`SharedScheduler`]: scheduler::SharedScheduler
//! [`Subject`]: subject::Subject

pub mod clock;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;

#[cfg(doctest)]
mod readme {
  #![doc = include_str!("../README.md")]
}
