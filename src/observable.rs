//! The cold, restartable stream template and its subscribe surface.
//!
//! An [`Observable`] is only a recipe: nothing happens until
//! `actual_subscribe` consumes it with a [`Subscriber`]. Operators hold
//! their source by value, so re-subscribing a composition means cloning the
//! composed value; every creation function and operator here derives
//! `Clone` when its parts allow.

use crate::{
  observer::{Observer, PartialObserver},
  ops::{
    delay::DelayOp,
    filter::FilterOp,
    map::MapOp,
    merge_map::{identity_project, MergeMapOp},
    take::TakeOp,
    try_map::TryMapOp,
  },
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::Subscription,
};
use std::time::Duration;

mod boxed;
mod create;
mod from_iter;
mod of;
mod trivial;

pub use boxed::BoxObservable;
pub use create::{create, Create};
pub use from_iter::{from_iter, FromIter};
pub use of::{of, Of};
pub use trivial::{empty, never, throw, Empty, Never, Throw};

/// A push-stream template. Subscribing consumes the value and wires the
/// given [`Subscriber`] up to the producer.
pub trait Observable<Item, Err>: Sized {
  /// Core protocol entry: connect `subscriber` to this source. Everything
  /// user-facing goes through the sugar on [`ObservableExt`].
  fn actual_subscribe(self, subscriber: Subscriber<Item, Err>);
}

/// Subscribe sugar and operator constructors, blanket-implemented for every
/// [`Observable`].
pub trait ObservableExt<Item, Err>: Observable<Item, Err> {
  /// Subscribe with a `next` handler only. Errors reaching this subscriber
  /// go to the unhandled channel.
  fn subscribe<N>(self, next: N) -> Subscription
  where
    N: FnMut(Item) + 'static,
    Item: 'static,
    Err: 'static,
  {
    self.subscribe_observer(PartialObserver::new(Some(next), None::<fn(Err)>, None::<fn()>))
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> Subscription
  where
    N: FnMut(Item) + 'static,
    E: FnMut(Err) + 'static,
    Item: 'static,
    Err: 'static,
  {
    self.subscribe_observer(PartialObserver::new(Some(next), Some(error), None::<fn()>))
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Subscription
  where
    N: FnMut(Item) + 'static,
    E: FnMut(Err) + 'static,
    C: FnMut() + 'static,
    Item: 'static,
    Err: 'static,
  {
    self.subscribe_observer(PartialObserver::new(Some(next), Some(error), Some(complete)))
  }

  /// Subscribe a full observer. The positional variants above reduce to
  /// this.
  fn subscribe_observer<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
    Item: 'static,
    Err: 'static,
  {
    let subscriber = Subscriber::new(observer);
    let subscription = subscriber.subscription();
    self.actual_subscribe(subscriber);
    subscription
  }

  fn map<Out, F>(self, f: F) -> MapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Out,
  {
    MapOp::new(self, f)
  }

  /// Like [`map`](ObservableExt::map), but the projection may fail; a
  /// failure is routed to the destination's error channel and never crosses
  /// into the upstream producer's call stack.
  fn try_map<Out, F>(self, f: F) -> TryMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Result<Out, Err>,
  {
    TryMapOp::new(self, f)
  }

  fn filter<F>(self, predicate: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    FilterOp::new(self, predicate)
  }

  /// Pass through the first `count` values, then complete and detach from
  /// the source.
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp::new(self, count) }

  /// Project each value to an inner observable and flatten, keeping at most
  /// `concurrent` inner sources subscribed; excess values queue in arrival
  /// order. `usize::MAX` means unbounded.
  fn merge_map<Inner, F>(self, project: F, concurrent: usize) -> MergeMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Result<Inner, Err>,
  {
    MergeMapOp::new(self, project, concurrent)
  }

  /// Flatten a stream of observables, at most `concurrent` at a time.
  fn merge_all(self, concurrent: usize) -> MergeMapOp<Self, fn(Item) -> Result<Item, Err>, Item> {
    MergeMapOp::new(self, identity_project, concurrent)
  }

  /// Strictly sequential [`merge_map`](ObservableExt::merge_map): the next
  /// inner source is not admitted until the previous one completes.
  fn concat_map<Inner, F>(self, project: F) -> MergeMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Result<Inner, Err>,
  {
    MergeMapOp::new(self, project, 1)
  }

  fn concat_all(self) -> MergeMapOp<Self, fn(Item) -> Result<Item, Err>, Item> {
    MergeMapOp::new(self, identity_project, 1)
  }

  /// Reschedule `next` and `complete` onto `scheduler`, `delay` after they
  /// arrive. Errors are delivered immediately: an upstream failure should
  /// not wait behind queued values.
  fn delay<S>(self, delay: Duration, scheduler: S) -> DelayOp<Self, S>
  where
    S: Scheduler,
  {
    DelayOp::new(self, delay, scheduler)
  }

  /// Erase the concrete operator type, for storing heterogeneous sources in
  /// one collection.
  fn box_it(self) -> BoxObservable<Item, Err>
  where
    Self: 'static,
    Item: 'static,
    Err: 'static,
  {
    BoxObservable::new(self)
  }
}

impl<T, Item, Err> ObservableExt<Item, Err> for T where T: Observable<Item, Err> {}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use super::*;

  #[test]
  fn subscribe_variants() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    from_iter::<_, Infallible>(1..=3).subscribe(move |v| s.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);

    let outcome = Rc::new(RefCell::new((0, false)));
    let (n, c) = (outcome.clone(), outcome.clone());
    from_iter::<_, Infallible>(1..=3).subscribe_all(
      move |_| n.borrow_mut().0 += 1,
      |_| {},
      move || c.borrow_mut().1 = true,
    );
    assert_eq!(*outcome.borrow(), (3, true));
  }

  #[test]
  fn subscription_closes_after_synchronous_source() {
    let subscription = from_iter::<_, Infallible>(0..3).subscribe(|_| {});
    assert!(crate::subscription::SubscriptionLike::is_closed(&subscription));
  }

  #[test]
  fn cold_source_restarts_per_subscription() {
    let source = from_iter::<_, Infallible>(0..3).map(|v| v * 10);
    let first = Rc::new(RefCell::new(Vec::new()));
    let second = Rc::new(RefCell::new(Vec::new()));
    let (f, s) = (first.clone(), second.clone());
    source.clone().subscribe(move |v| f.borrow_mut().push(v));
    source.subscribe(move |v| s.borrow_mut().push(v));
    assert_eq!(*first.borrow(), vec![0, 10, 20]);
    assert_eq!(*second.borrow(), vec![0, 10, 20]);
  }
}
