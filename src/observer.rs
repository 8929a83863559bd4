//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).
//!
//! The delivery contract: `error` or `complete` is called at most once and
//! nothing is called after it, and calls to one observer never overlap.
//! Observers take `&mut self`, so overlapping calls can only come from code
//! that shares an observer behind a lock; fan-in operators do that through
//! [`SerializedObserver`](crate::ops::serialize::SerializedObserver).

use crate::error::RxError;

pub trait Observer<T>: Send {
  /// Receive the next value from the observable
  fn next(&mut self, value: T);

  /// Receive the terminal error of the observable
  fn error(&mut self, err: RxError);

  /// Receive the normal completion of the observable
  fn complete(&mut self);
}

/// Type-erased observer as handed from one composition step to the next.
pub type BoxObserver<T> = Box<dyn Observer<T>>;

impl<T, O> Observer<T> for Box<O>
where
  O: Observer<T> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: T) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: RxError) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }
}

/// One signal of the observer protocol, as a value.
///
/// Operators that queue signals for later delivery (`delay`, `observe_on`)
/// store them as notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<T> {
  Next(T),
  Error(RxError),
  Complete,
}

impl<T> Notification<T> {
  /// Whether this is the terminal signal of a stream.
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  pub fn deliver<O>(self, observer: &mut O)
  where
    O: Observer<T> + ?Sized,
  {
    match self {
      Notification::Next(v) => observer.next(v),
      Notification::Error(e) => observer.error(e),
      Notification::Complete => observer.complete(),
    }
  }
}

/// Observer built from three closures.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> ObserverAll<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self { ObserverAll { next, error, complete } }
}

impl<T, N, E, C> Observer<T> for ObserverAll<N, E, C>
where
  N: FnMut(T) + Send,
  E: FnMut(RxError) + Send,
  C: FnMut() + Send,
{
  #[inline]
  fn next(&mut self, value: T) { (self.next)(value) }

  #[inline]
  fn error(&mut self, err: RxError) { (self.error)(err) }

  #[inline]
  fn complete(&mut self) { (self.complete)() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn notification_delivery() {
    let mut seen = vec![];
    {
      let mut observer = ObserverAll::new(
        |v: i32| seen.push(format!("next {v}")),
        |_: RxError| {},
        || {},
      );
      Notification::Next(1).deliver(&mut observer);
      Notification::Next(2).deliver(&mut observer);
    }
    assert_eq!(seen, vec!["next 1", "next 2"]);
    assert!(Notification::<i32>::Complete.is_terminal());
    assert!(Notification::<i32>::Error(RxError::Empty).is_terminal());
    assert!(!Notification::Next(0).is_terminal());
  }

  #[test]
  fn boxed_observer_forwards() {
    let mut count = 0;
    let mut completed = false;
    {
      let mut boxed: Box<dyn Observer<i32> + '_> =
        Box::new(ObserverAll::new(|_: i32| count += 1, |_: RxError| {}, || completed = true));
      boxed.next(1);
      boxed.next(2);
      boxed.complete();
    }
    assert_eq!(count, 2);
    assert!(completed);
  }
}
