//! Time sources.
//!
//! Every scheduler is a [`Clock`], so time-windowed operators read time from
//! the scheduler they run on. This keeps them deterministic under the virtual
//! time of [`TestScheduler`](crate::scheduler::TestScheduler).

use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
  /// Current point in time according to this clock.
  fn now(&self) -> Instant;

  /// Time elapsed since `earlier`, zero if `earlier` lies in the future.
  fn since(&self, earlier: Instant) -> Duration { self.now().saturating_duration_since(earlier) }
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
  #[inline]
  fn now(&self) -> Instant { (**self).now() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn since_saturates() {
    let clock = SystemClock;
    let future = clock.now() + Duration::from_secs(60);
    assert_eq!(clock.since(future), Duration::ZERO);
  }

  #[test]
  fn since_measures_elapsed() {
    let clock = SystemClock;
    let start = clock.now();
    std::thread::sleep(Duration::from_millis(5));
    assert!(clock.since(start) >= Duration::from_millis(5));
  }
}
