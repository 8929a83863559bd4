//! Automatic connection of connectable observables.

use crate::{
  observable::{ConnectableObservable, Observable, Value},
  rc::MutArc,
  subscription::Subscription,
};

#[derive(Default)]
struct RefCountState {
  count: usize,
  connection: Option<Subscription>,
}

#[derive(Default)]
struct AutoConnectState {
  subscribed: usize,
  connected: bool,
}

impl<T: Value> ConnectableObservable<T> {
  /// Connect while at least one subscriber is attached.
  ///
  /// The first subscriber connects the source; when the last one goes away
  /// the connection is canceled. A later subscriber connects again.
  pub fn ref_count(&self) -> Observable<T> {
    let connectable = self.clone();
    let state = MutArc::own(RefCountState::default());
    Observable::new(move |observer, scheduler, subscription| {
      connectable
        .fork()
        .actual_subscribe(observer, scheduler, subscription);

      let connect = {
        let mut st = state.rc_deref_mut();
        st.count += 1;
        if st.count == 1 {
          let connection = Subscription::new();
          st.connection = Some(connection.clone());
          Some(connection)
        } else {
          None
        }
      };

      let on_leave = state.clone();
      subscription.on_cancel(move || {
        let connection = {
          let mut st = on_leave.rc_deref_mut();
          st.count = st.count.saturating_sub(1);
          if st.count == 0 { st.connection.take() } else { None }
        };
        if let Some(connection) = connection {
          tracing::debug!("ref_count: last subscriber left, disconnecting");
          connection.cancel();
        }
      });

      if let Some(connection) = connect {
        tracing::debug!("ref_count: first subscriber, connecting");
        connectable.connect_with(scheduler, &connection);
      }
    })
  }

  /// Connect once the `count`-th subscriber has attached and stay connected.
  ///
  /// Subscribers are counted in the order they take the internal lock, so
  /// among racing subscribe calls exactly one is the `count`-th. A count of
  /// zero behaves like one.
  pub fn auto_connect(&self, count: usize) -> Observable<T> {
    let connectable = self.clone();
    let threshold = count.max(1);
    let state = MutArc::own(AutoConnectState::default());
    Observable::new(move |observer, scheduler, subscription| {
      connectable
        .fork()
        .actual_subscribe(observer, scheduler, subscription);
      let should_connect = {
        let mut st = state.rc_deref_mut();
        st.subscribed += 1;
        let reached = !st.connected && st.subscribed >= threshold;
        st.connected |= reached;
        reached
      };
      if should_connect {
        tracing::debug!(threshold, "auto_connect threshold reached");
        connectable.connect(scheduler);
      }
    })
  }
}

impl<T: Value> Observable<T> {
  /// Shorthand for `publish().ref_count()`.
  pub fn share(&self) -> Observable<T> { self.publish().ref_count() }
}
