//! Subscriber: a Subscription that also receives notifications.
//!
//! Every observer handed to `subscribe` is wrapped in a [`Subscriber`]
//! before it sees a single notification. The wrapper owns the lifecycle
//! (its [`Subscription`]), silently drops anything arriving after a
//! terminal notification or an unsubscribe, and applies the error-admission
//! walk before delivering an `error` downstream.

use crate::{
  observer::Observer,
  subscription::{Subscription, SubscriptionLike},
  unhandled,
};

/// Wraps a destination observer with lifecycle and terminal-state policy.
///
/// Operator chains are built from these: each stage's state struct
/// implements [`Observer`] around the downstream `Subscriber`, and is itself
/// wrapped in a fresh upstream `Subscriber` whose subscription is a child of
/// the downstream one, so closing the outermost handle detaches every stage.
pub struct Subscriber<Item, Err> {
  subscription: Subscription,
  stopped: bool,
  destination: Box<dyn Observer<Item, Err>>,
}

impl<Item, Err> Subscriber<Item, Err> {
  pub fn new(destination: impl Observer<Item, Err> + 'static) -> Self {
    Subscriber {
      subscription: Subscription::new(),
      stopped: false,
      destination: Box::new(destination),
    }
  }

  /// The lifecycle handle of this subscriber.
  pub fn subscription(&self) -> Subscription { self.subscription }
}

impl<Item, Err: 'static> Observer<Item, Err> for Subscriber<Item, Err> {
  fn next(&mut self, value: Item) {
    if !self.is_stopped() {
      self.destination.next(value);
    }
  }

  fn error(&mut self, err: Err) {
    if self.is_stopped() {
      return;
    }
    self.stopped = true;
    if self.destination.can_report() {
      self.destination.error(err);
    } else {
      unhandled::report(err);
    }
    if let Err(teardown_err) = self.subscription.unsubscribe() {
      unhandled::report(teardown_err);
    }
  }

  fn complete(&mut self) {
    if self.is_stopped() {
      return;
    }
    self.stopped = true;
    self.destination.complete();
    if let Err(teardown_err) = self.subscription.unsubscribe() {
      unhandled::report(teardown_err);
    }
  }

  fn is_stopped(&self) -> bool { self.stopped || self.subscription.is_closed() }

  fn can_report(&self) -> bool {
    !self.stopped && !self.subscription.is_closed() && self.destination.can_report()
  }
}

impl<Item, Err> SubscriptionLike for Subscriber<Item, Err> {
  #[inline]
  fn unsubscribe(&self) -> Result<(), crate::subscription::UnsubscribeError> {
    self.subscription.unsubscribe()
  }

  #[inline]
  fn is_closed(&self) -> bool { self.subscription.is_closed() }
}
