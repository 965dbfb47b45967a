//! Multicast: a Subject is both an [`Observable`] anyone can subscribe to
//! and an [`Observer`] that fans every notification out to the current
//! subscribers.
//!
//! A subscriber that unsubscribes detaches only itself. After a terminal
//! notification the subject replays that terminal to late subscribers.

use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutRc,
  subscriber::Subscriber,
  subscription::Teardown,
};

enum SubjectState<Err> {
  Active,
  Completed,
  Errored(Err),
}

struct SubjectCore<Item, Err> {
  observers: Vec<(u64, MutRc<Subscriber<Item, Err>>)>,
  next_id: u64,
  state: SubjectState<Err>,
}

pub struct Subject<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject {
      core: MutRc::own(SubjectCore {
        observers: Vec::new(),
        next_id: 0,
        state: SubjectState::Active,
      }),
    }
  }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Subject::default() }

  /// Number of currently attached subscribers. Mostly useful in tests.
  pub fn observer_count(&self) -> usize { self.core.borrow().observers.len() }

  /// Live subscriber handles, for one round of fan-out. Snapshotting keeps
  /// the core unborrowed while downstream handlers run, so a handler may
  /// subscribe or unsubscribe reentrantly.
  fn snapshot(&self) -> Vec<MutRc<Subscriber<Item, Err>>> {
    self
      .core
      .borrow()
      .observers
      .iter()
      .map(|(_, observer)| observer.clone())
      .collect()
  }
}

impl<Item, Err> Observable<Item, Err> for Subject<Item, Err>
where
  Item: 'static,
  Err: Clone + 'static,
{
  fn actual_subscribe(self, mut subscriber: Subscriber<Item, Err>) {
    let id = {
      let mut guard = self.core.borrow_mut();
      let core = &mut *guard;
      match &core.state {
        SubjectState::Completed => None,
        SubjectState::Errored(err) => Some(Err(err.clone())),
        SubjectState::Active => {
          core.next_id += 1;
          Some(Ok(core.next_id))
        }
      }
    };
    match id {
      None => subscriber.complete(),
      Some(Err(err)) => subscriber.error(err),
      Some(Ok(id)) => {
        let subscription = subscriber.subscription();
        let shared = MutRc::own(subscriber);
        self.core.borrow_mut().observers.push((id, shared));
        let core = self.core.clone();
        subscription.add(Teardown::action(move || {
          core.borrow_mut().observers.retain(|(entry, _)| *entry != id);
        }));
      }
    }
  }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, value: Item) {
    if self.is_stopped() {
      return;
    }
    for observer in self.snapshot() {
      observer.borrow_mut().next(value.clone());
    }
  }

  fn error(&mut self, err: Err) {
    if self.is_stopped() {
      return;
    }
    self.core.borrow_mut().state = SubjectState::Errored(err.clone());
    let observers = self.snapshot();
    self.core.borrow_mut().observers.clear();
    for observer in observers {
      observer.borrow_mut().error(err.clone());
    }
  }

  fn complete(&mut self) {
    if self.is_stopped() {
      return;
    }
    self.core.borrow_mut().state = SubjectState::Completed;
    let observers = self.snapshot();
    self.core.borrow_mut().observers.clear();
    for observer in observers {
      observer.borrow_mut().complete();
    }
  }

  fn is_stopped(&self) -> bool {
    !matches!(self.core.borrow().state, SubjectState::Active)
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  #[test]
  fn broadcasts_to_every_subscriber() {
    let subject: Subject<i32, Infallible> = Subject::new();
    let first = Rc::new(RefCell::new(Vec::new()));
    let second = Rc::new(RefCell::new(Vec::new()));
    let (f, s) = (first.clone(), second.clone());
    subject.clone().subscribe(move |v| f.borrow_mut().push(v));
    subject.clone().map(|v| v * 2).subscribe(move |v| s.borrow_mut().push(v));

    let mut feed = subject.clone();
    feed.next(1);
    feed.next(2);
    assert_eq!(*first.borrow(), vec![1, 2]);
    assert_eq!(*second.borrow(), vec![2, 4]);
  }

  #[test]
  fn unsubscribing_one_leaves_the_rest() {
    let subject: Subject<i32, Infallible> = Subject::new();
    let kept = Rc::new(RefCell::new(Vec::new()));
    let k = kept.clone();
    let dropped = subject.clone().subscribe(|_| {});
    subject.clone().subscribe(move |v| k.borrow_mut().push(v));
    assert_eq!(subject.observer_count(), 2);

    dropped.unsubscribe().unwrap();
    assert_eq!(subject.observer_count(), 1);
    subject.clone().next(5);
    assert_eq!(*kept.borrow(), vec![5]);
  }

  #[test]
  fn terminal_is_replayed_to_late_subscribers() {
    let subject: Subject<i32, &'static str> = Subject::new();
    subject.clone().error("gone");
    let caught = Rc::new(RefCell::new(None));
    let c = caught.clone();
    subject.clone().subscribe_err(|_| {}, move |e| *c.borrow_mut() = Some(e));
    assert_eq!(*caught.borrow(), Some("gone"));
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn notifications_after_terminal_are_dropped() {
    let subject: Subject<i32, Infallible> = Subject::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    subject.clone().subscribe(move |v| l.borrow_mut().push(v));
    let mut feed = subject.clone();
    feed.next(1);
    feed.complete();
    feed.next(2);
    assert_eq!(*log.borrow(), vec![1]);
  }
}
