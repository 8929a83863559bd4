use crate::{
  error::RxError,
  observable::{Observable, Value},
  observer::Observer,
  ops::serialize::SerializedObserver,
  rc::MutArc,
  scheduler::SharedScheduler,
  subscription::Subscription,
};

struct RepeatCtx<T> {
  source: Observable<T>,
  observer: SerializedObserver<T>,
  remaining: MutArc<usize>,
  scheduler: SharedScheduler,
  parent: Subscription,
}

impl<T> Clone for RepeatCtx<T> {
  fn clone(&self) -> Self {
    RepeatCtx {
      source: self.source.clone(),
      observer: self.observer.clone(),
      remaining: self.remaining.clone(),
      scheduler: self.scheduler.clone(),
      parent: self.parent.clone(),
    }
  }
}

impl<T: Value> RepeatCtx<T> {
  fn subscribe_round(&self) {
    let round = self.parent.add_child();
    let observer = RepeatObserver { ctx: self.clone(), round: round.clone() };
    self
      .source
      .actual_subscribe(Box::new(observer), &self.scheduler, &round);
  }
}

struct RepeatObserver<T> {
  ctx: RepeatCtx<T>,
  round: Subscription,
}

impl<T: Value> Observer<T> for RepeatObserver<T> {
  fn next(&mut self, value: T) { self.ctx.observer.next(value) }

  fn error(&mut self, err: RxError) { self.ctx.observer.error(err) }

  fn complete(&mut self) {
    self.round.cancel();
    let remaining = {
      let mut remaining = self.ctx.remaining.rc_deref_mut();
      *remaining = remaining.saturating_sub(1);
      *remaining
    };
    if remaining == 0 {
      self.ctx.observer.complete();
      return;
    }
    tracing::trace!(remaining, "repeat resubscribing");
    let ctx = self.ctx.clone();
    self
      .ctx
      .scheduler
      .run_now(&self.ctx.parent, move || ctx.subscribe_round());
  }
}

impl<T: Value> Observable<T> {
  /// Subscribe to the source `count` times in a row, forwarding every value,
  /// and complete after the last round completes. An error ends the whole
  /// stream.
  ///
  /// Each new round is a fresh task on the subscribing scheduler. On the
  /// trampoline the rounds run one after another in the same loop, so large
  /// counts do not grow the stack.
  pub fn repeat(&self, count: usize) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |mut observer, scheduler, subscription| {
      if count == 0 {
        observer.complete();
        return;
      }
      tracing::debug!(count, "repeat subscribed");
      let ctx = RepeatCtx {
        source: source.clone(),
        observer: SerializedObserver::new(observer),
        remaining: MutArc::own(count),
        scheduler: scheduler.clone(),
        parent: subscription.clone(),
      };
      ctx.subscribe_round();
    })
  }
}
