use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A cloneable, thread-safe cell shared between an operator and the tasks it
/// schedules.
///
/// Locking never fails: a lock poisoned by a panicking task is recovered, the
/// protected state is still consistent for every operator in this crate
/// because they only mutate it through short, non-panicking critical sections.
#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn rc_deref(&self) -> MutexGuard<'_, T> { self.rc_deref_mut() }

  #[inline]
  pub fn rc_deref_mut(&self) -> MutexGuard<'_, T> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_state() {
    let a = MutArc::own(1);
    let b = a.clone();
    *b.rc_deref_mut() += 1;
    assert_eq!(*a.rc_deref(), 2);
    assert!(a.ptr_eq(&b));
  }

  #[test]
  fn recovers_from_poison() {
    let a = MutArc::own(0);
    let b = a.clone();
    let _ = std::thread::spawn(move || {
      let _guard = b.rc_deref_mut();
      panic!("poison the lock");
    })
    .join();
    *a.rc_deref_mut() = 7;
    assert_eq!(*a.rc_deref(), 7);
  }
}
