use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber, type_hint::TypeHint,
};

#[derive(Clone)]
pub struct MapOp<S, F, In> {
  source: S,
  func: F,
  _hint: TypeHint<In>,
}

impl<S, F, In> MapOp<S, F, In> {
  #[inline]
  pub(crate) fn new(source: S, func: F) -> Self {
    MapOp { source, func, _hint: TypeHint::new() }
  }
}

impl<In, Out, Err, S, F> Observable<Out, Err> for MapOp<S, F, In>
where
  S: Observable<In, Err>,
  F: FnMut(In) -> Out + 'static,
  In: 'static,
  Out: 'static,
  Err: 'static,
{
  fn actual_subscribe(self, subscriber: Subscriber<Out, Err>) {
    let MapOp { source, func, .. } = self;
    let destination = subscriber.subscription();
    let upstream = Subscriber::new(MapObserver { destination: subscriber, func });
    destination.add(upstream.subscription());
    source.actual_subscribe(upstream);
  }
}

struct MapObserver<D, F> {
  destination: D,
  func: F,
}

impl<In, Out, Err, D, F> Observer<In, Err> for MapObserver<D, F>
where
  D: Observer<Out, Err>,
  F: FnMut(In) -> Out,
{
  fn next(&mut self, value: In) { self.destination.next((self.func)(value)) }

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
  fn transforms_values() {
    let sum = Rc::new(RefCell::new(0));
    let s = sum.clone();
    from_iter::<_, Infallible>(100..101)
      .map(|v| v * 2)
      .subscribe(move |v| *s.borrow_mut() += v);
    assert_eq!(*sum.borrow(), 200);
  }

  #[test]
  fn types_can_change() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    from_iter::<_, Infallible>(vec!['a', 'b', 'c'])
      .map(|c| c.to_ascii_uppercase().to_string())
      .subscribe(move |v| l.borrow_mut().push(v));
    assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
  }

  #[test]
  fn terminal_passes_through() {
    let errored = Rc::new(RefCell::new(false));
    let e = errored.clone();
    throw::<i32, _>("bang")
      .map(|v| v + 1)
      .subscribe_err(|_| {}, move |_| *e.borrow_mut() = true);
    assert!(*errored.borrow());
  }
}
