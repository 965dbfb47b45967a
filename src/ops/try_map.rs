use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber, type_hint::TypeHint,
};

/// `map` with a fallible projection. A projection failure becomes an
/// `error` notification to the destination; the upstream producer's call
/// stack never sees it, and subsequent upstream values are dropped by the
/// closed chain.
#[derive(Clone)]
pub struct TryMapOp<S, F, In> {
  source: S,
  func: F,
  _hint: TypeHint<In>,
}

impl<S, F, In> TryMapOp<S, F, In> {
  #[inline]
  pub(crate) fn new(source: S, func: F) -> Self {
    TryMapOp { source, func, _hint: TypeHint::new() }
  }
}

impl<In, Out, Err, S, F> Observable<Out, Err> for TryMapOp<S, F, In>
where
  S: Observable<In, Err>,
  F: FnMut(In) -> Result<Out, Err> + 'static,
  In: 'static,
  Out: 'static,
  Err: 'static,
{
  fn actual_subscribe(self, subscriber: Subscriber<Out, Err>) {
    let TryMapOp { source, func, .. } = self;
    let destination = subscriber.subscription();
    let upstream = Subscriber::new(TryMapObserver { destination: subscriber, func });
    destination.add(upstream.subscription());
    source.actual_subscribe(upstream);
  }
}

struct TryMapObserver<D, F> {
  destination: D,
  func: F,
}

impl<In, Out, Err, D, F> Observer<In, Err> for TryMapObserver<D, F>
where
  D: Observer<Out, Err>,
  F: FnMut(In) -> Result<Out, Err>,
{
  fn next(&mut self, value: In) {
    match (self.func)(value) {
      Ok(out) => self.destination.next(out),
      Err(err) => self.destination.error(err),
    }
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) { self.destination.complete() }

  fn is_stopped(&self) -> bool { self.destination.is_stopped() }

  fn can_report(&self) -> bool { self.destination.can_report() }
}
