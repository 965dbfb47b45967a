use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

#[derive(Clone)]
pub struct FilterOp<S, F> {
  source: S,
  predicate: F,
}

impl<S, F> FilterOp<S, F> {
  #[inline]
  pub(crate) fn new(source: S, predicate: F) -> Self { FilterOp { source, predicate } }
}

impl<Item, Err, S, F> Observable<Item, Err> for FilterOp<S, F>
where
  S: Observable<Item, Err>,
  F: FnMut(&Item) -> bool + 'static,
  Item: 'static,
  Err: 'static,
{
  fn actual_subscribe(self, subscriber: Subscriber<Item, Err>) {
    let FilterOp { source, predicate } = self;
    let destination = subscriber.subscription();
    let upstream = Subscriber::new(FilterObserver { destination: subscriber, predicate });
    destination.add(upstream.subscription());
    source.actual_subscribe(upstream);
  }
}

struct FilterObserver<D, F> {
  destination: D,
  predicate: F,
}

impl<Item, Err, D, F> Observer<Item, Err> for FilterObserver<D, F>
where
  D: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.predicate)(&value) {
      self.destination.next(value)
    }
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) { self.destination.complete() }

  fn is_stopped(&self) -> bool { self.destination.is_stopped() }

  fn can_report(&self) -> bool { self.destination.can_report() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  #[test]
  fn keeps_matching_values() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    from_iter::<_, Infallible>(0..10)
      .filter(|v| v % 2 == 0)
      .subscribe(move |v| l.borrow_mut().push(v));
    assert_eq!(*log.borrow(), vec![0, 2, 4, 6, 8]);
  }
}
