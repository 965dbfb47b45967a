//! Channel for errors that have no consumer to receive them.
//!
//! Three situations produce an error after the point where a caller could
//! still catch it: an `error` notification reaching an observer with no
//! error handler, an error whose destination chain contains a stopped link,
//! and a teardown failing while an observer-driven unsubscribe is already in
//! flight. Such errors are pushed onto a thread-local channel instead of
//! unwinding the producer's stack, so a producer's delivery loop is never
//! corrupted by a downstream failure and a caller cannot intercept the error
//! with a local catch around the triggering call.
//!
//! Consumers (and tests) observe the channel with [`take_all`].

use std::{
  any::{type_name, Any},
  cell::RefCell,
  fmt::{Debug, Formatter},
  mem,
};

thread_local! {
  static CHANNEL: RefCell<Vec<UnhandledError>> = const { RefCell::new(Vec::new()) };
}

/// A type-erased error taken off the unhandled channel.
pub struct UnhandledError {
  type_name: &'static str,
  payload: Box<dyn Any>,
}

impl UnhandledError {
  /// The `std::any::type_name` of the reported error value.
  pub fn type_name(&self) -> &'static str { self.type_name }

  /// Recover the original error value.
  pub fn downcast<E: 'static>(self) -> Result<E, UnhandledError> {
    match self.payload.downcast::<E>() {
      Ok(e) => Ok(*e),
      Err(payload) => Err(UnhandledError { type_name: self.type_name, payload }),
    }
  }

  pub fn downcast_ref<E: 'static>(&self) -> Option<&E> { self.payload.downcast_ref() }
}

impl Debug for UnhandledError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UnhandledError")
      .field("type_name", &self.type_name)
      .finish()
  }
}

/// Push `err` onto the channel of the current thread.
pub fn report<E: 'static>(err: E) {
  CHANNEL.with(|c| {
    c.borrow_mut().push(UnhandledError {
      type_name: type_name::<E>(),
      payload: Box::new(err),
    })
  });
}

/// Drain every pending unhandled error, oldest first.
pub fn take_all() -> Vec<UnhandledError> { CHANNEL.with(|c| mem::take(&mut *c.borrow_mut())) }

/// Number of errors currently pending on the channel.
pub fn pending() -> usize { CHANNEL.with(|c| c.borrow().len()) }

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn report_and_take() {
    assert_eq!(pending(), 0);
    report("boom");
    report(42_i32);
    let errors = take_all();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].downcast_ref::<&str>(), Some(&"boom"));
    assert_eq!(errors[1].downcast_ref::<i32>(), Some(&42));
    assert_eq!(pending(), 0);
  }

  #[test]
  fn downcast_mismatch_keeps_payload() {
    report(7_u8);
    let err = take_all().pop().unwrap();
    let err = err.downcast::<String>().unwrap_err();
    assert_eq!(err.downcast::<u8>().unwrap(), 7);
  }
}
