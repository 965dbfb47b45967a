//! Concurrency-limited flattening: the shared machinery behind
//! `merge_map`, `merge_all`, `concat_map` and `concat_all`.
//!
//! One [`FlattenCore`] per subscription holds the destination, the count of
//! live inner sources, and a FIFO of source values awaiting a free slot.
//! Outer values are projected at admission time; a projection failure is an
//! error to the destination. The destination completes exactly once, when
//! the outer source has completed, no inner source is live, and the buffer
//! is empty.

use std::collections::VecDeque;

use crate::{
  observable::Observable, observer::Observer, rc::MutRc, subscriber::Subscriber,
  subscription::Subscription, type_hint::TypeHint,
};

pub(crate) fn identity_project<T, E>(value: T) -> Result<T, E> { Ok(value) }

#[derive(Clone)]
pub struct MergeMapOp<S, F, In> {
  source: S,
  project: F,
  concurrent: usize,
  _hint: TypeHint<In>,
}

impl<S, F, In> MergeMapOp<S, F, In> {
  #[inline]
  pub(crate) fn new(source: S, project: F, concurrent: usize) -> Self {
    MergeMapOp { source, project, concurrent, _hint: TypeHint::new() }
  }
}

impl<In, Inner, Out, Err, S, F> Observable<Out, Err> for MergeMapOp<S, F, In>
where
  S: Observable<In, Err>,
  Inner: Observable<Out, Err> + 'static,
  F: FnMut(In) -> Result<Inner, Err> + 'static,
  In: 'static,
  Out: 'static,
  Err: 'static,
{
  fn actual_subscribe(self, subscriber: Subscriber<Out, Err>) {
    let MergeMapOp { source, project, concurrent, .. } = self;
    let destination_subscription = subscriber.subscription();
    let core = MutRc::own(FlattenCore {
      destination: subscriber,
      destination_subscription,
      project,
      active: 0,
      buffer: VecDeque::new(),
      concurrent: concurrent.max(1),
      outer_completed: false,
    });
    let outer = Subscriber::new(OuterObserver { core });
    destination_subscription.add(outer.subscription());
    source.actual_subscribe(outer);
  }
}

struct FlattenCore<In, Out, Err, F> {
  destination: Subscriber<Out, Err>,
  destination_subscription: Subscription,
  project: F,
  active: usize,
  buffer: VecDeque<In>,
  concurrent: usize,
  outer_completed: bool,
}

/// Project `value` and subscribe the resulting inner source, registering it
/// as a child of the destination. Buffered values re-enter through here too.
fn admit<In, Inner, Out, Err, F>(core: &MutRc<FlattenCore<In, Out, Err, F>>, value: In)
where
  Inner: Observable<Out, Err> + 'static,
  F: FnMut(In) -> Result<Inner, Err> + 'static,
  In: 'static,
  Out: 'static,
  Err: 'static,
{
  let projected = {
    let mut state = core.borrow_mut();
    (state.project)(value)
  };
  match projected {
    Ok(inner_source) => {
      let destination_subscription = {
        let mut state = core.borrow_mut();
        state.active += 1;
        state.destination_subscription
      };
      let inner = Subscriber::new(InnerObserver { core: core.clone() });
      destination_subscription.add(inner.subscription());
      inner_source.actual_subscribe(inner);
    }
    Err(err) => core.borrow_mut().destination.error(err),
  }
}

struct OuterObserver<In, Out, Err, F> {
  core: MutRc<FlattenCore<In, Out, Err, F>>,
}

impl<In, Inner, Out, Err, F> Observer<In, Err> for OuterObserver<In, Out, Err, F>
where
  Inner: Observable<Out, Err> + 'static,
  F: FnMut(In) -> Result<Inner, Err> + 'static,
  In: 'static,
  Out: 'static,
  Err: 'static,
{
  fn next(&mut self, value: In) {
    let admitted = {
      let mut state = self.core.borrow_mut();
      if state.active < state.concurrent {
        Some(value)
      } else {
        state.buffer.push_back(value);
        None
      }
    };
    if let Some(value) = admitted {
      admit(&self.core, value);
    }
  }

  fn error(&mut self, err: Err) { self.core.borrow_mut().destination.error(err) }

  fn complete(&mut self) {
    let finished = {
      let mut state = self.core.borrow_mut();
      state.outer_completed = true;
      state.active == 0 && state.buffer.is_empty()
    };
    if finished {
      self.core.borrow_mut().destination.complete();
    }
  }

  fn is_stopped(&self) -> bool { self.core.borrow().destination.is_stopped() }

  fn can_report(&self) -> bool { self.core.borrow().destination.can_report() }
}

struct InnerObserver<In, Out, Err, F> {
  core: MutRc<FlattenCore<In, Out, Err, F>>,
}

impl<In, Inner, Out, Err, F> Observer<Out, Err> for InnerObserver<In, Out, Err, F>
where
  Inner: Observable<Out, Err> + 'static,
  F: FnMut(In) -> Result<Inner, Err> + 'static,
  In: 'static,
  Out: 'static,
  Err: 'static,
{
  fn next(&mut self, value: Out) { self.core.borrow_mut().destination.next(value) }

  fn error(&mut self, err: Err) { self.core.borrow_mut().destination.error(err) }

  fn complete(&mut self) {
    enum Step<In> {
      Admit(In),
      Complete,
      Wait,
    }
    let step = {
      let mut state = self.core.borrow_mut();
      state.active -= 1;
      if let Some(value) = state.buffer.pop_front() {
        Step::Admit(value)
      } else if state.active == 0 && state.outer_completed {
        Step::Complete
      } else {
        Step::Wait
      }
    };
    match step {
      Step::Admit(value) => admit(&self.core, value),
      Step::Complete => self.core.borrow_mut().destination.complete(),
      Step::Wait => {}
    }
  }

  fn is_stopped(&self) -> bool { self.core.borrow().destination.is_stopped() }

  fn can_report(&self) -> bool { self.core.borrow().destination.can_report() }
}
