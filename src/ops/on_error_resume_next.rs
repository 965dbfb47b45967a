//! Resume-on-termination chaining: run sources in order, treating error and
//! completion alike as "move to the next source".

use std::collections::VecDeque;

use crate::{
  observable::{BoxObservable, Observable},
  observer::Observer,
  rc::MutRc,
  subscriber::Subscriber,
  subscription::Subscription,
};

/// Subscribe to each source in turn; on either its error or its completion,
/// switch to the next. The error is discarded entirely; only an operator
/// applied before this point can still observe it. With no sources the
/// result completes immediately.
pub fn on_error_resume_next<Item, Err>(
  sources: impl IntoIterator<Item = BoxObservable<Item, Err>>,
) -> OnErrorResumeNextOp<Item, Err> {
  OnErrorResumeNextOp { sources: sources.into_iter().collect() }
}

pub struct OnErrorResumeNextOp<Item, Err> {
  sources: VecDeque<BoxObservable<Item, Err>>,
}

impl<Item, Err> Observable<Item, Err> for OnErrorResumeNextOp<Item, Err>
where
  Item: 'static,
  Err: 'static,
{
  fn actual_subscribe(self, subscriber: Subscriber<Item, Err>) {
    let destination_subscription = subscriber.subscription();
    let chain = MutRc::own(ResumeChain {
      destination: subscriber,
      destination_subscription,
      remaining: self.sources,
    });
    advance(&chain);
  }
}

struct ResumeChain<Item, Err> {
  destination: Subscriber<Item, Err>,
  destination_subscription: Subscription,
  remaining: VecDeque<BoxObservable<Item, Err>>,
}

fn advance<Item: 'static, Err: 'static>(chain: &MutRc<ResumeChain<Item, Err>>) {
  let next_source = {
    let mut state = chain.borrow_mut();
    if state.destination.is_stopped() {
      return;
    }
    state.remaining.pop_front()
  };
  match next_source {
    None => chain.borrow_mut().destination.complete(),
    Some(source) => {
      let destination_subscription = chain.borrow().destination_subscription;
      let subscriber = Subscriber::new(ResumeObserver { chain: chain.clone() });
      destination_subscription.add(subscriber.subscription());
      source.actual_subscribe(subscriber);
    }
  }
}

struct ResumeObserver<Item, Err> {
  chain: MutRc<ResumeChain<Item, Err>>,
}

impl<Item: 'static, Err: 'static> Observer<Item, Err> for ResumeObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.chain.borrow_mut().destination.next(value) }

  fn error(&mut self, _err: Err) { advance(&self.chain) }

  fn complete(&mut self) { advance(&self.chain) }

  fn is_stopped(&self) -> bool { self.chain.borrow().destination.is_stopped() }

  // Errors are consumed here whatever the downstream state, so delivery is
  // always admissible.
  fn can_report(&self) -> bool { true }
}

#[cfg(test)]
mod test {
  use super::on_error_resume_next;
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn error_switches_to_next_source() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(false));
    let (l, c) = (log.clone(), completed.clone());
    let failing = create(|mut subscriber: Subscriber<i32, &str>| {
      subscriber.next(1);
      subscriber.error("swallowed");
    });
    on_error_resume_next(vec![failing.box_it(), of(2).box_it()]).subscribe_all(
      move |v| l.borrow_mut().push(v),
      |_| panic!("error must never reach the consumer"),
      move || *c.borrow_mut() = true,
    );
    assert_eq!(*log.borrow(), vec![1, 2]);
    assert!(*completed.borrow());
    assert_eq!(crate::unhandled::pending(), 0);
  }

  #[test]
  fn completion_also_advances() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    on_error_resume_next::<i32, &str>(vec![of(1).box_it(), of(2).box_it(), of(3).box_it()])
      .subscribe_err(move |v| l.borrow_mut().push(v), |_| {});
    assert_eq!(*log.borrow(), vec![1, 2, 3]);
  }

  #[test]
  fn no_sources_completes_immediately() {
    let completed = Rc::new(RefCell::new(false));
    let c = completed.clone();
    on_error_resume_next::<i32, &str>(Vec::new()).subscribe_all(
      |_| {},
      |_| {},
      move || *c.borrow_mut() = true,
    );
    assert!(*completed.borrow());
  }

  #[test]
  fn unsubscribe_stops_the_chain() {
    let second_subscribed = Rc::new(RefCell::new(false));
    let s = second_subscribed.clone();
    let first = never::<i32, &str>();
    let second = create(move |_subscriber: Subscriber<i32, &str>| *s.borrow_mut() = true);
    let subscription =
      on_error_resume_next(vec![first.box_it(), second.box_it()]).subscribe(|_| {});
    subscription.unsubscribe().unwrap();
    assert!(!*second_subscribed.borrow());
  }
}
