use std::{
  collections::VecDeque,
  fmt,
  sync::Arc,
  time::{Duration, Instant},
};

use crate::clock::{Clock, SystemClock};

/// Buffer ceiling used when a replay capacity of zero is configured.
pub const DEFAULT_REPLAY_CAPACITY: usize = 16384;

/// Configuration of a replaying subject.
///
/// ```rust
/// use std::time::Duration;
/// use rxkit::subject::ReplayConfig;
///
/// let config = ReplayConfig::new().capacity(10).max_age(Duration::from_secs(3600));
/// assert_eq!(config.effective_capacity(), 10);
/// ```
#[derive(Clone)]
pub struct ReplayConfig {
  capacity: usize,
  max_age: Duration,
  clock: Arc<dyn Clock>,
}

impl ReplayConfig {
  /// Unbounded age, default capacity, wall clock.
  pub fn new() -> Self { ReplayConfig { capacity: 0, max_age: Duration::ZERO, clock: Arc::new(SystemClock) } }

  /// Maximum number of buffered values; `0` selects
  /// [`DEFAULT_REPLAY_CAPACITY`].
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Values older than `max_age` are not replayed; zero means they never
  /// expire.
  pub fn max_age(mut self, max_age: Duration) -> Self {
    self.max_age = max_age;
    self
  }

  /// Clock used to stamp and age buffered values.
  pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  pub fn effective_capacity(&self) -> usize {
    if self.capacity == 0 { DEFAULT_REPLAY_CAPACITY } else { self.capacity }
  }
}

impl Default for ReplayConfig {
  fn default() -> Self { Self::new() }
}

impl fmt::Debug for ReplayConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReplayConfig")
      .field("capacity", &self.capacity)
      .field("max_age", &self.max_age)
      .finish()
  }
}

/// Bounded buffer of received values with their receipt time, oldest first.
pub(crate) struct ReplayBuffer<T> {
  entries: VecDeque<(T, Instant)>,
  capacity: usize,
  max_age: Duration,
  clock: Arc<dyn Clock>,
}

impl<T: Clone> ReplayBuffer<T> {
  pub(crate) fn new(config: ReplayConfig) -> Self {
    ReplayBuffer {
      entries: VecDeque::new(),
      capacity: config.effective_capacity(),
      max_age: config.max_age,
      clock: config.clock,
    }
  }

  pub(crate) fn push(&mut self, value: T) {
    if self.entries.len() == self.capacity {
      self.entries.pop_front();
    }
    self.entries.push_back((value, self.clock.now()));
  }

  /// Values that have not expired, oldest first. Expired values are pruned.
  pub(crate) fn snapshot(&mut self) -> Vec<T> {
    if !self.max_age.is_zero() {
      let now = self.clock.now();
      let max_age = self.max_age;
      while let Some((_, received)) = self.entries.front() {
        if now.saturating_duration_since(*received) < max_age {
          break;
        }
        self.entries.pop_front();
      }
    }
    self.entries.iter().map(|(v, _)| v.clone()).collect()
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize { self.entries.len() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scheduler::TestScheduler;

  #[test]
  fn drops_oldest_beyond_capacity() {
    let mut buffer = ReplayBuffer::new(ReplayConfig::new().capacity(3));
    for v in 0..5 {
      buffer.push(v);
    }
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.snapshot(), vec![2, 3, 4]);
  }

  #[test]
  fn zero_capacity_means_default_ceiling() {
    assert_eq!(ReplayConfig::new().effective_capacity(), DEFAULT_REPLAY_CAPACITY);
  }

  #[test]
  fn expired_values_are_skipped() {
    let clock = TestScheduler::default();
    let mut buffer =
      ReplayBuffer::new(ReplayConfig::new().max_age(Duration::from_millis(100)).clock(clock.clone()));
    buffer.push("old");
    clock.advance_by(Duration::from_millis(60));
    buffer.push("new");
    clock.advance_by(Duration::from_millis(50));
    assert_eq!(buffer.snapshot(), vec!["new"]);
    clock.advance_by(Duration::from_millis(50));
    assert!(buffer.snapshot().is_empty());
  }

  #[test]
  fn zero_age_never_expires() {
    let clock = TestScheduler::default();
    let mut buffer = ReplayBuffer::new(ReplayConfig::new().clock(clock.clone()));
    buffer.push(1);
    clock.advance_by(Duration::from_secs(86_400));
    assert_eq!(buffer.snapshot(), vec![1]);
  }
}
