//! Schedulers: pluggable policies deciding when and where tasks run.
//!
//! A [`Task`] is a step function. Each step returns a [`TaskState`] telling
//! the scheduler whether the task is done, wants to run again as soon as
//! possible, or wants to run again after a delay. This one shape covers the
//! three scheduling primitives observables need:
//!
//! - run-now: a task that finishes after its first step,
//! - run-later-recursive: a task that yields to be stepped again,
//! - run-after: a task scheduled with a delay that sleeps between steps.
//!
//! | Policy | Type | Behaviour |
//! |--------|------|-----------|
//! | immediate | [`ImmediateScheduler`] | runs every step synchronously, nested |
//! | trampoline | [`TrampolineScheduler`] | FIFO loop on the first scheduling thread, never nested |
//! | concurrent | [`ThreadScheduler`] | one new thread per task, drain waits for all of them |
//! | queued | [`QueuedScheduler`] | tasks only run when `drain` is called |
//! | virtual time | [`TestScheduler`] | tasks run when the test advances time |

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use crate::{clock::Clock, subscription::Subscription};

mod immediate;
mod queue;
mod queued;
pub mod test_scheduler;
mod thread_scheduler;
mod trampoline;

pub use immediate::ImmediateScheduler;
pub use queued::QueuedScheduler;
pub use test_scheduler::TestScheduler;
pub use thread_scheduler::ThreadScheduler;
pub use trampoline::TrampolineScheduler;

/// What a task wants after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  /// The task is done and is dropped.
  Finished,
  /// Step the task again as soon as the policy allows.
  Yield,
  /// Step the task again after the given duration.
  Sleeping(Duration),
}

/// A unit of work owned by a scheduler until it finishes.
///
/// A task may be bound to a subscription; once that subscription is canceled
/// the task finishes without running its next step.
pub struct Task {
  step: Box<dyn FnMut() -> TaskState + Send>,
  token: Option<Subscription>,
}

impl Task {
  pub fn new(step: impl FnMut() -> TaskState + Send + 'static) -> Self {
    Task { step: Box::new(step), token: None }
  }

  /// A task that runs `f` once.
  pub fn once(f: impl FnOnce() + Send + 'static) -> Self {
    let mut f = Some(f);
    Task::new(move || {
      if let Some(f) = f.take() {
        f();
      }
      TaskState::Finished
    })
  }

  /// Bind the task to `subscription`.
  pub fn cancel_on(mut self, subscription: &Subscription) -> Self {
    self.token = Some(subscription.clone());
    self
  }

  pub fn is_canceled(&self) -> bool { self.token.as_ref().map_or(false, Subscription::is_canceled) }

  /// Run one step, or finish right away if the task was canceled.
  pub fn step(&mut self) -> TaskState {
    if self.is_canceled() {
      return TaskState::Finished;
    }
    (self.step)()
  }

  /// Block the calling thread for `delay`, waking early if the task is
  /// canceled meanwhile.
  pub(crate) fn sleep(&self, delay: Duration) {
    match &self.token {
      Some(token) => {
        token.wait_timeout(delay);
      }
      None => std::thread::sleep(delay),
    }
  }

  /// Step the task on the current thread until it finishes.
  pub(crate) fn run_to_completion(&mut self) {
    loop {
      match self.step() {
        TaskState::Finished => return,
        TaskState::Yield => {}
        TaskState::Sleeping(delay) => self.sleep(delay),
      }
    }
  }
}

/// A Scheduler is an object to order tasks and schedule their execution.
pub trait Scheduler: Clock {
  /// Submit a task, to be stepped first after `delay` (or as soon as the
  /// policy allows when `None`).
  fn schedule(&self, task: Task, delay: Option<Duration>);

  /// Block until all work submitted to this scheduler has finished or been
  /// canceled. Policies that only run work on request run it here.
  fn drain(&self);
}

/// Cloneable handle to a scheduler, threaded through every subscription.
#[derive(Clone)]
pub struct SharedScheduler(Arc<dyn Scheduler>);

impl SharedScheduler {
  pub fn new(scheduler: impl Scheduler + 'static) -> Self { SharedScheduler(Arc::new(scheduler)) }

  pub fn immediate() -> Self { Self::new(ImmediateScheduler) }

  pub fn trampoline() -> Self { Self::new(TrampolineScheduler::default()) }

  pub fn new_thread() -> Self { Self::new(ThreadScheduler::default()) }

  pub fn queued() -> Self { Self::new(QueuedScheduler::default()) }

  /// Run `f` once, unless `subscription` is already canceled.
  pub fn run_now(&self, subscription: &Subscription, f: impl FnOnce() + Send + 'static) {
    if subscription.is_canceled() {
      return;
    }
    self.0.schedule(Task::once(f).cancel_on(subscription), None);
  }

  /// Step `f` until it returns [`TaskState::Finished`] or `subscription` is
  /// canceled.
  pub fn run_recursive(
    &self, subscription: &Subscription, f: impl FnMut() -> TaskState + Send + 'static,
  ) {
    if subscription.is_canceled() {
      return;
    }
    self.0.schedule(Task::new(f).cancel_on(subscription), None);
  }

  /// Like [`run_recursive`](Self::run_recursive) but the first step happens
  /// after `delay`.
  pub fn run_after(
    &self, subscription: &Subscription, delay: Duration,
    f: impl FnMut() -> TaskState + Send + 'static,
  ) {
    if subscription.is_canceled() {
      return;
    }
    self
      .0
      .schedule(Task::new(f).cancel_on(subscription), Some(delay));
  }

  #[inline]
  pub fn schedule(&self, task: Task, delay: Option<Duration>) { self.0.schedule(task, delay) }

  #[inline]
  pub fn drain(&self) { self.0.drain() }
}

impl Clock for SharedScheduler {
  #[inline]
  fn now(&self) -> Instant { self.0.now() }
}

/// The trampoline: the documented default at the outermost call boundary.
impl Default for SharedScheduler {
  fn default() -> Self { Self::trampoline() }
}

impl<S: Scheduler + 'static> From<S> for SharedScheduler {
  fn from(scheduler: S) -> Self { SharedScheduler::new(scheduler) }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  #[test]
  fn once_task_runs_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let mut task = Task::once(move || {
      c.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(task.step(), TaskState::Finished);
    assert_eq!(task.step(), TaskState::Finished);
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn canceled_task_skips_step() {
    let sub = Subscription::new();
    let mut task = Task::new(|| panic!("must not run")).cancel_on(&sub);
    sub.cancel();
    assert!(task.is_canceled());
    assert_eq!(task.step(), TaskState::Finished);
  }

  #[test]
  fn run_now_on_canceled_subscription_is_noop() {
    let sub = Subscription::new();
    sub.cancel();
    SharedScheduler::immediate().run_now(&sub, || panic!("must not run"));
  }

  #[test]
  fn run_to_completion_sleeps_between_steps() {
    let steps = Arc::new(AtomicUsize::new(0));
    let s = steps.clone();
    let start = Instant::now();
    let mut task = Task::new(move || {
      if s.fetch_add(1, Ordering::SeqCst) < 2 {
        TaskState::Sleeping(Duration::from_millis(5))
      } else {
        TaskState::Finished
      }
    });
    task.run_to_completion();
    assert_eq!(steps.load(Ordering::SeqCst), 3);
    assert!(start.elapsed() >= Duration::from_millis(10));
  }
}
