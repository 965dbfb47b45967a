//! Shared-ownership interior mutability for operator state.
//!
//! Operator implementations that need one piece of state visible from
//! several observers (flattening bookkeeping, a multicast list, a shared
//! destination) wrap it in [`MutRc`]. Execution is single-threaded and
//! cooperative, so `Rc<RefCell<_>>` is the whole story.

use std::{
  cell::{Ref, RefCell, RefMut},
  rc::Rc,
};

use crate::observer::Observer;

pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { MutRc(Rc::new(RefCell::new(t))) }

  #[inline]
  pub fn borrow(&self) -> Ref<'_, T> { self.0.borrow() }

  #[inline]
  pub fn borrow_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { MutRc(self.0.clone()) }
}

impl<T: Default> Default for MutRc<T> {
  fn default() -> Self { MutRc::own(T::default()) }
}

impl<Item, Err, T> Observer<Item, Err> for MutRc<T>
where
  T: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.borrow_mut().next(value) }

  fn error(&mut self, err: Err) { self.borrow_mut().error(err) }

  fn complete(&mut self) { self.borrow_mut().complete() }

  fn is_stopped(&self) -> bool { self.borrow().is_stopped() }

  fn can_report(&self) -> bool { self.borrow().can_report() }
}
