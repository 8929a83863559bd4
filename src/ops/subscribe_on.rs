use crate::{
  observable::{Observable, Value},
  scheduler::SharedScheduler,
};

impl<T: Value> Observable<T> {
  /// Subscribe to the source from a task on `target`; the source and
  /// everything upstream of it run on `target`.
  pub fn subscribe_on(&self, target: SharedScheduler) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |observer, _, subscription| {
      let (source, scheduler, sub) = (source.clone(), target.clone(), subscription.clone());
      target.run_now(subscription, move || source.actual_subscribe(observer, &scheduler, &sub));
    })
  }
}

#[cfg(test)]
mod tests {
  use std::thread;

  use crate::prelude::*;

  #[test]
  fn source_runs_on_target() {
    let caller = thread::current().id();
    let producer_thread = observable::start(|| thread::current().id())
      .subscribe_on(SharedScheduler::new_thread())
      .to_single(&SharedScheduler::trampoline())
      .unwrap();
    assert_ne!(producer_thread, caller);
  }
}
