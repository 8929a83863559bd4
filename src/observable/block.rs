//! Blocking and future terminal functions.
//!
//! Each of them subscribes on the given scheduler, runs the scheduler's drain
//! and blocks the calling thread until the stream terminates. On the
//! [`ThreadScheduler`](crate::scheduler::ThreadScheduler) this waits for the
//! worker threads; on the trampoline the work usually already ran inside the
//! subscribe call.

use std::future::Future;

use futures::{channel::oneshot, FutureExt};

use super::{Observable, Value};
use crate::{error::RxError, rc::MutArc, scheduler::SharedScheduler};

impl<T: Value> Observable<T> {
  /// Block until the stream terminates and collect every value.
  pub fn to_vec(&self, scheduler: &SharedScheduler) -> Result<Vec<T>, RxError> {
    let values = MutArc::own(Vec::new());
    let failure = MutArc::own(None);
    let (v, f) = (values.clone(), failure.clone());
    self
      .subscribe_all(
        move |value| v.rc_deref_mut().push(value),
        move |err| *f.rc_deref_mut() = Some(err),
        || {},
        scheduler,
      )
      .wait();
    let failure = failure.rc_deref_mut().take();
    match failure {
      Some(err) => Err(err),
      None => Ok(std::mem::take(&mut *values.rc_deref_mut())),
    }
  }

  /// Block until the stream terminates and return its only value.
  ///
  /// Fails with [`RxError::Empty`] or [`RxError::TooManyValues`] when the
  /// stream does not emit exactly one value.
  pub fn to_single(&self, scheduler: &SharedScheduler) -> Result<T, RxError> {
    self
      .single()
      .to_vec(scheduler)?
      .pop()
      .ok_or(RxError::Empty)
  }

  /// Block until the stream terminates, discarding values.
  pub fn wait(&self, scheduler: &SharedScheduler) -> Result<(), RxError> {
    let failure = MutArc::own(None);
    let f = failure.clone();
    self
      .subscribe_all(|_| {}, move |err| *f.rc_deref_mut() = Some(err), || {}, scheduler)
      .wait();
    let failure = failure.rc_deref_mut().take();
    failure.map_or(Ok(()), Err)
  }

  /// Subscribe and return a future resolving with the single value of the
  /// stream.
  ///
  /// The future does not drive the scheduler: on the trampoline or a thread
  /// scheduler the work runs by itself, on a queued or test scheduler the
  /// caller drains it.
  pub fn to_future(
    &self, scheduler: &SharedScheduler,
  ) -> impl Future<Output = Result<T, RxError>> + Send + 'static {
    let (sender, receiver) = oneshot::channel();
    let sender = MutArc::own(Some(sender));
    let (on_value, on_error) = (sender.clone(), sender);
    self.single().subscribe_all(
      move |value| {
        if let Some(tx) = on_value.rc_deref_mut().take() {
          let _ = tx.send(Ok(value));
        }
      },
      move |err| {
        if let Some(tx) = on_error.rc_deref_mut().take() {
          let _ = tx.send(Err(err));
        }
      },
      || {},
      scheduler,
    );
    receiver.map(|received| {
      received.unwrap_or_else(|_| Err(RxError::msg("subscription canceled before a value arrived")))
    })
  }
}
