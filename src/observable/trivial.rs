use crate::{observable::Observable, observer::Observer, subscriber::Subscriber, type_hint::TypeHint};

/// Complete immediately without emitting.
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(TypeHint::new()) }

/// Never emit and never terminate. The subscription stays open until the
/// consumer closes it.
pub fn never<Item, Err>() -> Never<Item, Err> { Never(TypeHint::new()) }

/// Emit nothing and fail immediately with `err`.
pub fn throw<Item, Err>(err: Err) -> Throw<Item, Err> {
  Throw { err, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct Empty<Item, Err>(TypeHint<(Item, Err)>);

impl<Item, Err: 'static> Observable<Item, Err> for Empty<Item, Err> {
  fn actual_subscribe(self, mut subscriber: Subscriber<Item, Err>) { subscriber.complete() }
}

#[derive(Clone)]
pub struct Never<Item, Err>(TypeHint<(Item, Err)>);

impl<Item, Err> Observable<Item, Err> for Never<Item, Err> {
  fn actual_subscribe(self, _subscriber: Subscriber<Item, Err>) {}
}

#[derive(Clone)]
pub struct Throw<Item, Err> {
  err: Err,
  _hint: TypeHint<Item>,
}

impl<Item, Err: 'static> Observable<Item, Err> for Throw<Item, Err> {
  fn actual_subscribe(self, mut subscriber: Subscriber<Item, Err>) { subscriber.error(self.err) }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  #[test]
  fn empty_completes_without_values() {
    let state = Rc::new(RefCell::new((0, false)));
    let (n, c) = (state.clone(), state.clone());
    empty::<i32, Infallible>().subscribe_all(
      move |_| n.borrow_mut().0 += 1,
      |_| {},
      move || c.borrow_mut().1 = true,
    );
    assert_eq!(*state.borrow(), (0, true));
  }

  #[test]
  fn never_leaves_subscription_open() {
    let subscription = never::<i32, Infallible>().subscribe(|_| {});
    assert!(!subscription.is_closed());
    subscription.unsubscribe().unwrap();
  }

  #[test]
  fn throw_delivers_error() {
    let caught = Rc::new(RefCell::new(None));
    let c = caught.clone();
    throw::<i32, _>("bad").subscribe_err(|_| {}, move |e| *c.borrow_mut() = Some(e));
    assert_eq!(*caught.borrow(), Some("bad"));
  }
}
