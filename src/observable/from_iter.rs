use crate::{observable::Observable, observer::Observer, subscriber::Subscriber, type_hint::TypeHint};

/// Emit every item of an iterator, then complete.
///
/// The terminal flag is checked between emissions, so a consumer that
/// unsubscribes mid-stream stops the loop immediately.
pub fn from_iter<I, Err>(iter: I) -> FromIter<I, Err>
where
  I: IntoIterator,
{
  FromIter { iter, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct FromIter<I, Err> {
  iter: I,
  _hint: TypeHint<Err>,
}

impl<Item, Err, I> Observable<Item, Err> for FromIter<I, Err>
where
  I: IntoIterator<Item = Item>,
  Err: 'static,
{
  fn actual_subscribe(self, mut subscriber: Subscriber<Item, Err>) {
    for value in self.iter {
      if subscriber.is_stopped() {
        return;
      }
      subscriber.next(value);
    }
    subscriber.complete();
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  #[test]
  fn emits_all_then_completes() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(false));
    let (l, c) = (log.clone(), completed.clone());
    from_iter::<_, Infallible>(vec!['a', 'b'])
      .subscribe_all(move |v| l.borrow_mut().push(v), |_| {}, move || *c.borrow_mut() = true);
    assert_eq!(*log.borrow(), vec!['a', 'b']);
    assert!(*completed.borrow());
  }

  #[test]
  fn stops_iterating_once_consumer_is_gone() {
    // `take` closes the chain after two values; the producer must notice and
    // not run the endless range to exhaustion.
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    from_iter::<_, Infallible>(0..)
      .take(2)
      .subscribe(move |v| s.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![0, 1]);
  }
}
