use crate::{observable::Observable, subscriber::Subscriber};

/// Build an observable from a raw subscribe function.
///
/// The function receives the [`Subscriber`] by value: emit with the observer
/// channels, register cleanup through `subscriber.subscription().add(..)`,
/// and move the subscriber into a scheduled action if production is
/// deferred. Producers that loop synchronously are expected to check
/// `is_stopped` between emissions.
///
/// ```
/// use rill::prelude::*;
/// use std::{cell::RefCell, rc::Rc};
///
/// let sum = Rc::new(RefCell::new(0));
/// let s = sum.clone();
/// create(|mut subscriber: Subscriber<i32, &str>| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
/// })
/// .subscribe(move |v| *s.borrow_mut() += v);
/// assert_eq!(*sum.borrow(), 3);
/// ```
pub fn create<Item, Err, F>(subscribe: F) -> Create<F>
where
  F: FnOnce(Subscriber<Item, Err>),
{
  Create(subscribe)
}

#[derive(Clone)]
pub struct Create<F>(F);

impl<Item, Err, F> Observable<Item, Err> for Create<F>
where
  F: FnOnce(Subscriber<Item, Err>),
{
  fn actual_subscribe(self, subscriber: Subscriber<Item, Err>) { (self.0)(subscriber) }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn producer_teardown_runs_on_unsubscribe() {
    let released = Rc::new(RefCell::new(false));
    let r = released.clone();
    let subscription = create(move |subscriber: Subscriber<i32, &str>| {
      let r = r.clone();
      subscriber
        .subscription()
        .add(Teardown::action(move || *r.borrow_mut() = true));
    })
    .subscribe(|_| {});
    assert!(!*released.borrow());
    subscription.unsubscribe().unwrap();
    assert!(*released.borrow());
  }

  #[test]
  fn notifications_after_terminal_are_dropped() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    create(|mut subscriber: Subscriber<i32, &str>| {
      subscriber.next(1);
      subscriber.complete();
      subscriber.next(2);
      subscriber.error("never");
    })
    .subscribe_all(
      move |v| l.borrow_mut().push(v),
      |_| panic!("error after complete"),
      || {},
    );
    assert_eq!(*log.borrow(), vec![1]);
  }
}
