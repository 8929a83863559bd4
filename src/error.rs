//! Error taxonomy shared by every observable in the crate.
//!
//! An error is terminal for the observable that raised it: it is delivered
//! downstream exactly once and nothing follows it. Errors are fanned out by
//! subjects and merges, so `RxError` is cheap to clone.

use std::{error::Error, sync::Arc, time::Duration};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RxError {
  /// An arbitrary error reported by a producer.
  #[error("{0}")]
  Upstream(Arc<dyn Error + Send + Sync + 'static>),

  /// A producer error described only by a message.
  #[error("{0}")]
  Message(String),

  /// No value or terminal signal arrived within the deadline.
  #[error("no notification within {0:?}")]
  Timeout(Duration),

  /// A single-value assertion saw the source complete without a value.
  #[error("expected exactly one value but the source completed empty")]
  Empty,

  /// A single-value assertion saw a second value.
  #[error("expected exactly one value but the source emitted more")]
  TooManyValues,

  /// A producer panicked while running inside a scheduled task.
  #[error("producer panicked: {0}")]
  TaskPanic(String),
}

impl RxError {
  pub fn msg(message: impl Into<String>) -> Self { RxError::Message(message.into()) }

  pub fn upstream(err: impl Error + Send + Sync + 'static) -> Self {
    RxError::Upstream(Arc::new(err))
  }

  pub fn is_timeout(&self) -> bool { matches!(self, RxError::Timeout(_)) }

  pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
      (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "unknown panic payload".to_owned()
    };
    RxError::TaskPanic(message)
  }
}

impl PartialEq for RxError {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (RxError::Upstream(a), RxError::Upstream(b)) => Arc::ptr_eq(a, b),
      (RxError::Message(a), RxError::Message(b)) => a == b,
      (RxError::Timeout(a), RxError::Timeout(b)) => a == b,
      (RxError::Empty, RxError::Empty) | (RxError::TooManyValues, RxError::TooManyValues) => true,
      (RxError::TaskPanic(a), RxError::TaskPanic(b)) => a == b,
      _ => false,
    }
  }
}
