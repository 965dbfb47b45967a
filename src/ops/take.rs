use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

#[derive(Clone)]
pub struct TakeOp<S> {
  source: S,
  count: usize,
}

impl<S> TakeOp<S> {
  #[inline]
  pub(crate) fn new(source: S, count: usize) -> Self { TakeOp { source, count } }
}

impl<Item, Err, S> Observable<Item, Err> for TakeOp<S>
where
  S: Observable<Item, Err>,
  Item: 'static,
  Err: 'static,
{
  fn actual_subscribe(self, mut subscriber: Subscriber<Item, Err>) {
    let TakeOp { source, count } = self;
    if count == 0 {
      subscriber.complete();
      return;
    }
    let destination = subscriber.subscription();
    let upstream = Subscriber::new(TakeObserver { destination: subscriber, remaining: count });
    destination.add(upstream.subscription());
    source.actual_subscribe(upstream);
  }
}

struct TakeObserver<D> {
  destination: D,
  remaining: usize,
}

impl<Item, Err, D> Observer<Item, Err> for TakeObserver<D>
where
  D: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.destination.next(value);
    if self.remaining == 0 {
      // Completing the destination cascades an unsubscribe back up through
      // the chain, which is what detaches the source.
      self.destination.complete();
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
  fn smoke() {
    let completed = Rc::new(RefCell::new(false));
    let log = Rc::new(RefCell::new(Vec::new()));
    let (c, l) = (completed.clone(), log.clone());
    from_iter::<_, Infallible>(0..100)
      .take(5)
      .subscribe_all(move |v| l.borrow_mut().push(v), |_| {}, move || *c.borrow_mut() = true);
    assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 4]);
    assert!(*completed.borrow());
  }

  #[test]
  fn take_zero_completes_without_subscribing() {
    let subscribed = Rc::new(RefCell::new(false));
    let completed = Rc::new(RefCell::new(false));
    let (s, c) = (subscribed.clone(), completed.clone());
    create(move |_subscriber: Subscriber<i32, Infallible>| *s.borrow_mut() = true)
      .take(0)
      .subscribe_all(|_| {}, |_| {}, move || *c.borrow_mut() = true);
    assert!(!*subscribed.borrow());
    assert!(*completed.borrow());
  }

  #[test]
  fn shorter_source_completes_normally() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    from_iter::<_, Infallible>(0..2).take(5).subscribe(move |v| l.borrow_mut().push(v));
    assert_eq!(*log.borrow(), vec![0, 1]);
  }
}
