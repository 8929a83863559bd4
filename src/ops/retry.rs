//! Retry operator implementation
//!
//! Resubscribes to the source when it errors, as decided by a
//! [`RetryPolicy`]. Every resubscription is a fresh task on the subscribing
//! scheduler, so on the trampoline any number of retries runs without
//! growing the stack.
//!
//! ```rust
//! use std::time::Duration;
//! use rxkit::{ops::retry::RetryConfig, prelude::*};
//!
//! let config = RetryConfig::new().count(5).delay(Duration::from_millis(1)).reset_on_success();
//! let values = observable::of(1).retry(config).to_vec(&SharedScheduler::trampoline());
//! assert_eq!(values, Ok(vec![1]));
//! ```

use std::time::Duration;

use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::Observer,
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::{SharedScheduler, TaskState},
  subscription::Subscription,
};

/// Policy for determining whether to retry an error.
///
/// Simple policies like `usize` (count) and richer ones like [`RetryConfig`]
/// (count + delay + reset) are provided. Implement the trait for custom
/// logic.
pub trait RetryPolicy: Send + Sync + 'static {
  /// `Some(delay)` to resubscribe after `delay`, `None` to propagate `err`.
  ///
  /// `attempt` is the number of retries already made: 0 on the first error.
  fn should_retry(&self, err: &RxError, attempt: usize) -> Option<Duration>;

  /// Whether a successfully emitted value resets the attempt counter.
  fn reset_on_success(&self) -> bool { false }
}

impl RetryPolicy for usize {
  fn should_retry(&self, _err: &RxError, attempt: usize) -> Option<Duration> {
    if attempt < *self { Some(Duration::ZERO) } else { None }
  }
}

/// Builder for a retry policy.
///
/// Allows configuring:
/// - Maximum retry count
/// - Delay between retries
/// - Whether to reset the retry count on successful emission
#[derive(Debug, Clone, Default)]
pub struct RetryConfig {
  count: Option<usize>,
  delay: Option<Duration>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Unlimited retries without delay.
  pub fn new() -> Self { Self::default() }

  /// `count(3)` allows 3 retries, so at most 4 subscriptions in total.
  pub fn count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  pub fn delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }
}

impl RetryPolicy for RetryConfig {
  fn should_retry(&self, _err: &RxError, attempt: usize) -> Option<Duration> {
    match self.count {
      Some(count) if attempt >= count => None,
      _ => Some(self.delay.unwrap_or(Duration::ZERO)),
    }
  }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

struct RetryCtx<T, P> {
  source: Observable<T>,
  policy: std::sync::Arc<P>,
  observer: SerializedObserver<T>,
  attempts: MutArc<usize>,
  scheduler: SharedScheduler,
  parent: Subscription,
}

impl<T, P> Clone for RetryCtx<T, P> {
  fn clone(&self) -> Self {
    RetryCtx {
      source: self.source.clone(),
      policy: self.policy.clone(),
      observer: self.observer.clone(),
      attempts: self.attempts.clone(),
      scheduler: self.scheduler.clone(),
      parent: self.parent.clone(),
    }
  }
}

impl<T: Value, P: RetryPolicy> RetryCtx<T, P> {
  fn subscribe_round(&self) {
    let round = self.parent.add_child();
    let observer = RetryObserver { ctx: self.clone(), round: round.clone() };
    self
      .source
      .actual_subscribe(Box::new(observer), &self.scheduler, &round);
  }
}

struct RetryObserver<T, P> {
  ctx: RetryCtx<T, P>,
  round: Subscription,
}

impl<T: Value, P: RetryPolicy> Observer<T> for RetryObserver<T, P> {
  fn next(&mut self, value: T) {
    if self.ctx.policy.reset_on_success() {
      *self.ctx.attempts.rc_deref_mut() = 0;
    }
    self.ctx.observer.next(value);
  }

  fn error(&mut self, err: RxError) {
    self.round.cancel();
    let decision = {
      let mut attempts = self.ctx.attempts.rc_deref_mut();
      let decision = self.ctx.policy.should_retry(&err, *attempts);
      if decision.is_some() {
        *attempts += 1;
      }
      decision.map(|delay| (delay, *attempts))
    };
    match decision {
      Some((delay, attempt)) => {
        tracing::debug!(attempt, ?delay, error = %err, "retrying after error");
        let ctx = self.ctx.clone();
        let mut resubscribe = Some(move || ctx.subscribe_round());
        let step = move || {
          if let Some(f) = resubscribe.take() {
            f();
          }
          TaskState::Finished
        };
        if delay.is_zero() {
          self.ctx.scheduler.run_recursive(&self.ctx.parent, step);
        } else {
          self.ctx.scheduler.run_after(&self.ctx.parent, delay, step);
        }
      }
      None => self.ctx.observer.error(err),
    }
  }

  fn complete(&mut self) { self.ctx.observer.complete() }
}

impl<T: Value> Observable<T> {
  /// Resubscribe to the source after an error, as long as `policy` allows.
  pub fn retry<P: RetryPolicy>(&self, policy: P) -> Observable<T> {
    let source = self.clone();
    let policy = std::sync::Arc::new(policy);
    Observable::new(move |observer, scheduler, subscription| {
      let ctx = RetryCtx {
        source: source.clone(),
        policy: policy.clone(),
        observer: SerializedObserver::new(observer),
        attempts: MutArc::own(0),
        scheduler: scheduler.clone(),
        parent: subscription.clone(),
      };
      ctx.subscribe_round();
    })
  }
}
