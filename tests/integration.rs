//! Integration tests for the engine as a whole: scheduling, composition,
//! multicast and cancellation working together.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  thread,
  time::{Duration, Instant},
};

use rxkit::prelude::*;

fn timed(points: Vec<(u64, i32)>) -> Observable<i32> {
  let points = Arc::new(points);
  let first = Duration::from_millis(points[0].0);
  observable::create_future_recursive(first, move |e: &Emitter<i32>| {
    let i = e.index();
    e.next(points[i].1);
    match points.get(i + 1) {
      Some((at, _)) => Duration::from_millis(at - points[i].0),
      None => {
        e.complete();
        Duration::ZERO
      }
    }
  })
}

#[test]
fn concat_keeps_source_order() {
  let values = observable::concat([
    observable::from_iter([0, 1, 2, 3]),
    observable::from_iter([4, 5]),
    observable::of(6),
  ])
  .to_vec(&SharedScheduler::trampoline());
  assert_eq!(values, Ok(vec![0, 1, 2, 3, 4, 5, 6]));
}

#[test]
fn concat_of_threaded_sources_never_interleaves() {
  let slow = observable::create(|e: Emitter<i32>| {
    for v in 0..3 {
      thread::sleep(Duration::from_millis(5));
      e.next(v);
    }
    e.complete();
  });
  let values = observable::concat([slow, observable::from_iter([3, 4])])
    .to_vec(&SharedScheduler::new_thread());
  assert_eq!(values, Ok(vec![0, 1, 2, 3, 4]));
}

#[test]
fn merge_delivers_in_arrival_order() {
  let scheduler = TestScheduler::default();
  let values = observable::merge([timed(vec![(10, 1), (30, 3)]), timed(vec![(5, 0), (20, 2)])])
    .to_vec(&SharedScheduler::from(scheduler.clone()));
  assert_eq!(values, Ok(vec![0, 1, 2, 3]));
  assert_eq!(scheduler.elapsed(), Duration::from_millis(30));
}

#[test]
fn repeat_a_million_times_on_the_trampoline() {
  let values = observable::from_iter(["v1", "v2", "v3"])
    .repeat(1_000_000)
    .to_vec(&SharedScheduler::trampoline())
    .unwrap();
  assert_eq!(values.len(), 3_000_000);
  assert_eq!(&values[values.len() - 9..], &["v1", "v2", "v3", "v1", "v2", "v3", "v1", "v2", "v3"]);
}

#[test]
fn replay_serves_subscriber_attached_after_completion() {
  let subject = Subject::replay(
    ReplayConfig::new()
      .capacity(10)
      .max_age(Duration::from_secs(3600)),
  );
  subject.next(123);
  subject.next(456);
  subject.complete();

  let log = Arc::new(Mutex::new(vec![]));
  let (values, done) = (log.clone(), log.clone());
  subject.observable().subscribe_all(
    move |v: i32| values.lock().unwrap().push(v.to_string()),
    |_| {},
    move || done.lock().unwrap().push("complete".to_string()),
    &SharedScheduler::trampoline(),
  );
  assert_eq!(*log.lock().unwrap(), vec!["123", "456", "complete"]);
}

#[test]
fn timeout_fires_inside_the_window() {
  let producer = observable::create(|e: Emitter<i32>| {
    e.next(1);
    let stall = Instant::now();
    while stall.elapsed() < Duration::from_millis(500) {
      if e.is_canceled() {
        return;
      }
      thread::sleep(Duration::from_millis(10));
    }
    e.complete();
  });

  let values = Arc::new(Mutex::new(vec![]));
  let failure = Arc::new(Mutex::new(None));
  let (v, f) = (values.clone(), failure.clone());
  let start = Instant::now();
  producer
    .timeout(Duration::from_millis(250))
    .subscribe_all(
      move |value| v.lock().unwrap().push(value),
      move |err| *f.lock().unwrap() = Some((err, start.elapsed())),
      || {},
      &SharedScheduler::new_thread(),
    )
    .wait();

  assert_eq!(*values.lock().unwrap(), vec![1]);
  let (err, elapsed) = failure.lock().unwrap().take().unwrap();
  assert_eq!(err, RxError::Timeout(Duration::from_millis(250)));
  assert!(elapsed > Duration::from_millis(250), "{elapsed:?}");
  assert!(elapsed < Duration::from_millis(500), "{elapsed:?}");
}

#[test]
fn debounce_suppresses_superseded_values() {
  let scheduler = TestScheduler::default();
  let values = timed(vec![(100, 1), (400, 2), (480, 3), (590, 4)])
    .debounce(Duration::from_millis(100))
    .to_vec(&SharedScheduler::from(scheduler));
  assert_eq!(values, Ok(vec![1, 3, 4]));
}

#[test]
fn resubscription_is_independent() {
  let counter = Arc::new(AtomicUsize::new(0));
  let c = counter.clone();
  let source = observable::from_iter(1..=5)
    .scan(0, |acc, v| acc + v)
    .do_on_next(move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    })
    .filter(|v| v % 2 == 1);
  for scheduler in [SharedScheduler::trampoline(), SharedScheduler::new_thread()] {
    let first = source.to_vec(&scheduler);
    let second = source.to_vec(&scheduler);
    assert_eq!(first, Ok(vec![1, 3, 15]));
    assert_eq!(first, second);
  }
  assert_eq!(counter.load(Ordering::SeqCst), 20);
}

#[test]
fn concurrent_cancel_fires_callbacks_once() {
  for _ in 0..20 {
    let root = Subscription::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    root.on_cancel(move || {
      f.fetch_add(1, Ordering::SeqCst);
    });
    let children: Vec<_> = (0..4).map(|_| root.add_child()).collect();
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let root = root.clone();
        thread::spawn(move || root.cancel())
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(children.iter().all(Subscription::is_canceled));
  }
}

#[test]
fn shared_source_runs_once_for_many_subscribers() {
  let scheduler = SharedScheduler::new_thread();
  let subscriptions = Arc::new(AtomicUsize::new(0));
  let s = subscriptions.clone();
  let connectable = observable::defer(move || {
    s.fetch_add(1, Ordering::SeqCst);
    observable::range(0, 100)
  })
  .publish();

  let sums: Vec<_> = (0..4)
    .map(|_| {
      let sum = Arc::new(Mutex::new(0));
      let s = sum.clone();
      let sub = connectable
        .fork()
        .subscribe(move |v| *s.lock().unwrap() += v, &scheduler);
      (sum, sub)
    })
    .collect();
  connectable.connect(&scheduler);
  for (sum, sub) in sums {
    sub.wait();
    assert_eq!(*sum.lock().unwrap(), 4950);
  }
  assert_eq!(subscriptions.load(Ordering::SeqCst), 1);
}

#[test]
fn future_bridge_resolves_single_value() {
  let future = observable::timer("done", Duration::from_millis(5)).to_future(&SharedScheduler::new_thread());
  assert_eq!(futures::executor::block_on(future), Ok("done"));
}

#[test]
fn retry_then_catch_on_a_thread() {
  let attempts = Arc::new(AtomicUsize::new(0));
  let a = attempts.clone();
  let values = observable::create(move |e: Emitter<i32>| {
    a.fetch_add(1, Ordering::SeqCst);
    e.next(1);
    e.error(RxError::msg("flaky"));
  })
  .retry(2)
  .catch(observable::of(99))
  .to_vec(&SharedScheduler::new_thread());
  assert_eq!(values, Ok(vec![1, 1, 1, 99]));
  assert_eq!(attempts.load(Ordering::SeqCst), 3);
}
