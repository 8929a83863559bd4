use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  sync::{Condvar, Mutex, MutexGuard, PoisonError},
  time::{Duration, Instant},
};

use super::{Task, TaskState};

struct ScheduledTask {
  due: Instant,
  task_id: usize,
  task: Task,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

/// Tasks ordered by due time, FIFO among equal due times.
#[derive(Default)]
pub(crate) struct TaskQueue {
  heap: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

impl TaskQueue {
  pub(crate) fn push(&mut self, due: Instant, task: Task) {
    let task_id = self.next_task_id;
    self.next_task_id += 1;
    self.heap.push(ScheduledTask { due, task_id, task });
  }

  pub(crate) fn pop(&mut self) -> Option<(Instant, Task)> {
    self.heap.pop().map(|s| (s.due, s.task))
  }

  pub(crate) fn peek_due(&self) -> Option<Instant> { self.heap.peek().map(|s| s.due) }

  fn head_canceled(&self) -> bool { self.heap.peek().map_or(false, |s| s.task.is_canceled()) }

  pub(crate) fn len(&self) -> usize { self.heap.len() }

  pub(crate) fn is_empty(&self) -> bool { self.heap.is_empty() }
}

/// Longest the loop parks before looking at its head task again. A head task
/// canceled from another thread is dropped at the latest after this long.
const CANCEL_CHECK: Duration = Duration::from_millis(10);

#[derive(Default)]
struct LoopState {
  queue: TaskQueue,
  running: bool,
}

/// Due-ordered queue run by at most one thread at a time.
///
/// While the head task is not due yet the running thread parks on `wake`.
/// Every push notifies it, so a task scheduled from another thread with an
/// earlier due time is run first.
#[derive(Default)]
pub(crate) struct TaskLoop {
  state: Mutex<LoopState>,
  wake: Condvar,
}

impl TaskLoop {
  fn lock(&self) -> MutexGuard<'_, LoopState> { self.state.lock().unwrap_or_else(PoisonError::into_inner) }

  /// Queue `task` and wake the running loop. Returns whether no loop is
  /// running, in which case the flag is now set and the caller must run it.
  pub(crate) fn push(&self, due: Instant, task: Task) -> bool {
    let start = {
      let mut state = self.lock();
      state.queue.push(due, task);
      !std::mem::replace(&mut state.running, true)
    };
    self.wake.notify_one();
    start
  }

  /// Queue `task` without claiming the loop.
  pub(crate) fn enqueue(&self, due: Instant, task: Task) {
    self.lock().queue.push(due, task);
    self.wake.notify_one();
  }

  /// Claim the loop if nobody runs it. With `only_if_pending`, an empty
  /// queue is not claimed.
  pub(crate) fn try_claim(&self, only_if_pending: bool) -> bool {
    let mut state = self.lock();
    if state.running || (only_if_pending && state.queue.is_empty()) {
      return false;
    }
    state.running = true;
    true
  }

  pub(crate) fn pending_count(&self) -> usize { self.lock().queue.len() }

  /// Block until the head task is due and pop it. Canceled head tasks are
  /// dropped without waiting for them. Returns `None`, clearing `running`
  /// under the same lock, once the queue is empty, so no task pushed
  /// concurrently is stranded.
  fn next_due(&self) -> Option<Task> {
    let mut state = self.lock();
    loop {
      let Some(due) = state.queue.peek_due() else {
        state.running = false;
        return None;
      };
      let now = Instant::now();
      if due <= now || state.queue.head_canceled() {
        return state.queue.pop().map(|(_, task)| task);
      }
      let park = (due - now).min(CANCEL_CHECK);
      state = match self.wake.wait_timeout(state, park) {
        Ok((guard, _)) => guard,
        Err(poisoned) => poisoned.into_inner().0,
      };
    }
  }
}

/// Clears `running` if a task panics out of the loop, so the next schedule
/// call can start a fresh loop over the tasks left behind.
struct PanicReset<'a>(&'a TaskLoop);

impl Drop for PanicReset<'_> {
  fn drop(&mut self) {
    if std::thread::panicking() {
      self.0.lock().running = false;
    }
  }
}

/// Run queued tasks in due order on the current thread until the queue is
/// empty. The caller must have claimed the loop.
pub(crate) fn run_loop(tasks: &TaskLoop) {
  let _reset = PanicReset(tasks);
  while let Some(mut task) = tasks.next_due() {
    let reschedule = match task.step() {
      TaskState::Finished => None,
      TaskState::Yield => Some(Duration::ZERO),
      TaskState::Sleeping(delay) => Some(delay),
    };
    if let Some(delay) = reschedule {
      tasks.lock().queue.push(Instant::now() + delay, task);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn orders_by_due_then_fifo() {
    let mut queue = TaskQueue::default();
    let base = Instant::now();
    queue.push(base + Duration::from_millis(10), Task::once(|| {}));
    queue.push(base, Task::once(|| {}));
    queue.push(base, Task::once(|| {}));
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.peek_due(), Some(base));

    let order: Vec<_> = std::iter::from_fn(|| queue.heap.pop().map(|s| s.task_id)).collect();
    assert_eq!(order, vec![1, 2, 0]);
    assert!(queue.is_empty());
  }
}
