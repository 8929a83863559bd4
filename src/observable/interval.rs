use std::time::Duration;

use super::{create_future_recursive, Emitter, Observable};

/// Emits `0, 1, 2, ...` every `period`, starting one period after
/// subscription. Never completes on its own.
pub fn interval(period: Duration) -> Observable<usize> {
  create_future_recursive(period, move |emitter: &Emitter<usize>| {
    emitter.next(emitter.index());
    period
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    rc::MutArc,
    scheduler::{SharedScheduler, TestScheduler},
  };

  #[test]
  fn ticks_on_virtual_time() {
    let scheduler = TestScheduler::default();
    let out = MutArc::own(vec![]);
    let o = out.clone();
    let sub = interval(Duration::from_millis(10))
      .subscribe(move |v| o.rc_deref_mut().push(v), &SharedScheduler::from(scheduler.clone()));
    scheduler.advance_by(Duration::from_millis(9));
    assert!(out.rc_deref().is_empty());
    scheduler.advance_by(Duration::from_millis(31));
    assert_eq!(*out.rc_deref(), vec![0, 1, 2, 3]);
    sub.cancel();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(out.rc_deref().len(), 4);
  }

  #[test]
  fn take_completes_on_real_time() {
    let values = interval(Duration::from_millis(2))
      .take(3)
      .to_vec(&SharedScheduler::new_thread());
    assert_eq!(values, Ok(vec![0, 1, 2]));
  }
}
