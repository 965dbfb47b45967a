//! The three-channel notification contract.
//!
//! An [`Observer`] receives any number of `next` values followed by at most
//! one terminal notification (`error` or `complete`). The trait itself does
//! not police that protocol; [`crate::subscriber::Subscriber`] wraps an
//! observer and enforces it.

use crate::unhandled;

/// Consumer of a notification sequence.
///
/// All three channels take `&mut self`; terminal-state bookkeeping belongs
/// to the enclosing [`crate::subscriber::Subscriber`], which drops
/// notifications after a terminal one.
pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  fn error(&mut self, err: Err);

  fn complete(&mut self);

  /// `true` once this observer no longer acts on notifications. Producers
  /// check this between synchronous emissions so a cancelled consumer does
  /// not keep a tight loop running.
  fn is_stopped(&self) -> bool { false }

  /// Whether an `error` notification handed to this observer will actually
  /// reach a live consumer. Chained observers AND their own liveness with
  /// their destination's; an error refused here diverts to the unhandled
  /// channel instead of being swallowed by a stopped link.
  fn can_report(&self) -> bool { !self.is_stopped() }
}

/// Adapter from a partial handler set (any subset of next/error/complete)
/// to a full [`Observer`].
///
/// A missing `next` or `complete` handler ignores that channel. A missing
/// `error` handler routes error notifications to the unhandled channel;
/// they are never silently dropped.
pub struct PartialObserver<N, E, C> {
  next: Option<N>,
  error: Option<E>,
  complete: Option<C>,
}

impl<N, E, C> PartialObserver<N, E, C> {
  pub fn new(next: Option<N>, error: Option<E>, complete: Option<C>) -> Self {
    PartialObserver { next, error, complete }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for PartialObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnMut(Err),
  C: FnMut(),
  Err: 'static,
{
  fn next(&mut self, value: Item) {
    if let Some(next) = &mut self.next {
      next(value)
    }
  }

  fn error(&mut self, err: Err) {
    match &mut self.error {
      Some(error) => error(err),
      None => unhandled::report(err),
    }
  }

  fn complete(&mut self) {
    if let Some(complete) = &mut self.complete {
      complete()
    }
  }
}
