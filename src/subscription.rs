//! Subscription tree: unsubscribe-once resource handles with child ownership.
//!
//! Subscription records live in a thread-local arena and are addressed by
//! stable identifiers, so parent lists and child back-references are index
//! operations rather than reference-counted cycles. A [`Subscription`] is a
//! cheap `Copy` handle; a handle whose record has been vacated reads as
//! closed.

use std::{cell::RefCell, mem};

use slab::Slab;
use smallvec::SmallVec;
use thiserror::Error;

use crate::unhandled;

/// Error carried by a fallible teardown action.
pub type TeardownError = Box<dyn std::error::Error + 'static>;

/// Composite error raised by [`Subscription::unsubscribe`] when one or more
/// teardowns fail. Every sibling teardown still runs; the failures are
/// collected here in execution order, child failures flattened in.
#[derive(Debug, Error)]
#[error("{} teardown error(s) during unsubscribe", .0.len())]
pub struct UnsubscribeError(Vec<TeardownError>);

impl UnsubscribeError {
  pub fn errors(&self) -> &[TeardownError] { &self.0 }

  pub fn into_errors(self) -> Vec<TeardownError> { self.0 }
}

/// A release action registered with [`Subscription::add`]: either a closure
/// run at close time or a child subscription closed along with its owner.
pub enum Teardown {
  Action(Box<dyn FnOnce() -> Result<(), TeardownError>>),
  Child(Subscription),
}

impl Teardown {
  /// Wrap an infallible release closure.
  pub fn action(f: impl FnOnce() + 'static) -> Self {
    Teardown::Action(Box::new(move || {
      f();
      Ok(())
    }))
  }

  /// Wrap a release closure whose failure should surface from
  /// [`Subscription::unsubscribe`].
  pub fn fallible(f: impl FnOnce() -> Result<(), TeardownError> + 'static) -> Self {
    Teardown::Action(Box::new(f))
  }
}

impl From<Subscription> for Teardown {
  fn from(child: Subscription) -> Self { Teardown::Child(child) }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct SubscriptionId {
  slot: usize,
  serial: u64,
}

/// Identifies an entry registered with [`Subscription::add`] so that it can
/// later be [`Subscription::remove`]d without running it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeardownHandle {
  owner: SubscriptionId,
  kind: HandleKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandleKind {
  Noop,
  Action(u64),
  Child(SubscriptionId),
}

impl TeardownHandle {
  fn noop() -> Self {
    TeardownHandle {
      owner: SubscriptionId { slot: usize::MAX, serial: 0 },
      kind: HandleKind::Noop,
    }
  }
}

enum Entry {
  Action(u64, Box<dyn FnOnce() -> Result<(), TeardownError>>),
  Child(SubscriptionId),
}

struct Record {
  serial: u64,
  closed: bool,
  parent: Option<SubscriptionId>,
  next_key: u64,
  entries: SmallVec<[Entry; 1]>,
}

#[derive(Default)]
struct Registry {
  slots: Slab<Record>,
  serial: u64,
}

impl Registry {
  /// The record for `id`, provided it is still present and not closed.
  fn get_live_mut(&mut self, id: SubscriptionId) -> Option<&mut Record> {
    self
      .slots
      .get_mut(id.slot)
      .filter(|r| r.serial == id.serial && !r.closed)
  }

  fn detach_child(&mut self, parent: SubscriptionId, child: SubscriptionId) {
    if let Some(rec) = self.get_live_mut(parent) {
      rec
        .entries
        .retain(|e| !matches!(e, Entry::Child(c) if *c == child));
    }
  }

  fn release(&mut self, id: SubscriptionId) {
    let matches = self
      .slots
      .get(id.slot)
      .is_some_and(|r| r.serial == id.serial);
    if matches {
      self.slots.remove(id.slot);
    }
  }
}

thread_local! {
  static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

/// Common surface of cancellation handles. [`Subscription`] is the concrete
/// arena-backed implementation; scheduler action handles and operator
/// plumbing all speak this contract.
pub trait SubscriptionLike {
  /// Close the handle, running its teardowns. Idempotent.
  fn unsubscribe(&self) -> Result<(), UnsubscribeError>;

  fn is_closed(&self) -> bool;
}

/// An unsubscribe-once handle over a tree of owned resources.
///
/// A subscription owns an ordered list of teardowns: plain release closures
/// and child subscriptions. Closing it runs every teardown in insertion
/// order, even when some of them fail, and reports the failures as one
/// [`UnsubscribeError`]. Closing twice is a no-op.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Subscription {
  id: SubscriptionId,
}

impl Default for Subscription {
  fn default() -> Self { Subscription::new() }
}

impl Subscription {
  pub fn new() -> Self {
    REGISTRY.with(|r| {
      let mut reg = r.borrow_mut();
      reg.serial += 1;
      let serial = reg.serial;
      let slot = reg.slots.insert(Record {
        serial,
        closed: false,
        parent: None,
        next_key: 0,
        entries: SmallVec::new(),
      });
      Subscription { id: SubscriptionId { slot, serial } }
    })
  }

  /// A handle that is closed from the start; `add` on it runs teardowns
  /// immediately.
  pub fn closed() -> Self {
    Subscription { id: SubscriptionId { slot: usize::MAX, serial: 0 } }
  }

  /// Register a teardown, to be run when this subscription closes.
  ///
  /// If the subscription is already closed the teardown is executed
  /// immediately (a failure then goes to the unhandled channel, there being
  /// no unsubscribe caller to raise it to) and a no-op handle is returned.
  /// Adding a subscription to itself is ignored. Adding a child removes it
  /// from any previous owner's list: ownership is exclusive.
  pub fn add(&self, teardown: impl Into<Teardown>) -> TeardownHandle {
    match teardown.into() {
      Teardown::Action(f) => self.add_action(f),
      Teardown::Child(child) => self.add_child(child),
    }
  }

  /// Remove a previously added entry without running it. No-op if the entry
  /// already ran, was already removed, or belongs to another subscription.
  pub fn remove(&self, handle: TeardownHandle) {
    if handle.owner != self.id {
      return;
    }
    REGISTRY.with(|r| {
      let mut reg = r.borrow_mut();
      match handle.kind {
        HandleKind::Noop => {}
        HandleKind::Action(key) => {
          if let Some(rec) = reg.get_live_mut(self.id) {
            rec
              .entries
              .retain(|e| !matches!(e, Entry::Action(k, _) if *k == key));
          }
        }
        HandleKind::Child(child) => {
          reg.detach_child(self.id, child);
          if let Some(child_rec) = reg.get_live_mut(child) {
            if child_rec.parent == Some(self.id) {
              child_rec.parent = None;
            }
          }
        }
      }
    });
  }

  /// Number of teardowns currently registered. Mostly useful in tests.
  pub fn teardown_count(&self) -> usize {
    REGISTRY.with(|r| {
      let mut reg = r.borrow_mut();
      reg.get_live_mut(self.id).map_or(0, |rec| rec.entries.len())
    })
  }

  /// Consume the handle into an RAII guard that unsubscribes on drop.
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard(self) }

  fn add_action(&self, f: Box<dyn FnOnce() -> Result<(), TeardownError>>) -> TeardownHandle {
    let mut pending = Some(f);
    let handle = REGISTRY.with(|r| {
      let mut reg = r.borrow_mut();
      let rec = reg.get_live_mut(self.id)?;
      rec.next_key += 1;
      let key = rec.next_key;
      if let Some(f) = pending.take() {
        rec.entries.push(Entry::Action(key, f));
      }
      Some(TeardownHandle { owner: self.id, kind: HandleKind::Action(key) })
    });
    match handle {
      Some(handle) => handle,
      None => {
        if let Some(f) = pending.take() {
          if let Err(err) = f() {
            unhandled::report(err);
          }
        }
        TeardownHandle::noop()
      }
    }
  }

  fn add_child(&self, child: Subscription) -> TeardownHandle {
    if child.id == self.id {
      return TeardownHandle::noop();
    }
    enum Outcome {
      Stored(TeardownHandle),
      OwnerClosed,
      ChildClosed,
    }
    let outcome = REGISTRY.with(|r| {
      let mut reg = r.borrow_mut();
      if reg.get_live_mut(self.id).is_none() {
        return Outcome::OwnerClosed;
      }
      let previous = match reg.get_live_mut(child.id) {
        Some(child_rec) => child_rec.parent.replace(self.id),
        None => return Outcome::ChildClosed,
      };
      let handle = TeardownHandle { owner: self.id, kind: HandleKind::Child(child.id) };
      if previous == Some(self.id) {
        // Already owned here; the existing entry stands.
        return Outcome::Stored(handle);
      }
      if let Some(prev) = previous {
        reg.detach_child(prev, child.id);
      }
      if let Some(rec) = reg.get_live_mut(self.id) {
        rec.entries.push(Entry::Child(child.id));
      }
      Outcome::Stored(handle)
    });
    match outcome {
      Outcome::Stored(handle) => handle,
      Outcome::ChildClosed => TeardownHandle::noop(),
      Outcome::OwnerClosed => {
        if let Err(err) = child.unsubscribe() {
          unhandled::report(err);
        }
        TeardownHandle::noop()
      }
    }
  }
}

impl SubscriptionLike for Subscription {
  fn unsubscribe(&self) -> Result<(), UnsubscribeError> {
    let entries = REGISTRY.with(|r| {
      let mut reg = r.borrow_mut();
      let (parent, entries) = {
        let rec = reg.get_live_mut(self.id)?;
        // Terminal state first: reentrant checks during teardown must see
        // the subscription as closed.
        rec.closed = true;
        (rec.parent.take(), mem::take(&mut rec.entries))
      };
      if let Some(parent) = parent {
        reg.detach_child(parent, self.id);
      }
      Some(entries)
    });
    let Some(entries) = entries else {
      return Ok(());
    };

    let mut failures: Vec<TeardownError> = Vec::new();
    for entry in entries {
      match entry {
        Entry::Action(_, f) => {
          if let Err(err) = f() {
            failures.push(err);
          }
        }
        Entry::Child(id) => {
          let child = Subscription { id };
          if let Err(err) = child.unsubscribe() {
            failures.extend(err.into_errors());
          }
        }
      }
    }

    REGISTRY.with(|r| r.borrow_mut().release(self.id));

    if failures.is_empty() { Ok(()) } else { Err(UnsubscribeError(failures)) }
  }

  fn is_closed(&self) -> bool {
    REGISTRY.with(|r| {
      let reg = r.borrow();
      match reg.slots.get(self.id.slot) {
        Some(rec) if rec.serial == self.id.serial => rec.closed,
        _ => true,
      }
    })
  }
}

/// RAII wrapper that unsubscribes when dropped. Teardown failures on the
/// drop path go to the unhandled channel.
#[must_use]
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
  pub fn subscription(&self) -> Subscription { self.0 }
}

impl Drop for SubscriptionGuard {
  fn drop(&mut self) {
    if let Err(err) = self.0.unsubscribe() {
      unhandled::report(err);
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  fn probe() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Teardown) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    (log, move |tag| {
      let l = l.clone();
      Teardown::action(move || l.borrow_mut().push(tag))
    })
  }

  #[test]
  fn teardowns_run_in_insertion_order() {
    let (log, td) = probe();
    let s = Subscription::new();
    s.add(td("a"));
    s.add(td("b"));
    s.add(td("c"));
    assert_eq!(s.teardown_count(), 3);
    s.unsubscribe().unwrap();
    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
  }

  #[test]
  fn unsubscribe_is_idempotent() {
    let (log, td) = probe();
    let s = Subscription::new();
    s.add(td("once"));
    s.unsubscribe().unwrap();
    s.unsubscribe().unwrap();
    assert_eq!(*log.borrow(), vec!["once"]);
    assert!(s.is_closed());
  }

  #[test]
  fn failing_teardown_does_not_block_siblings() {
    let (log, td) = probe();
    let s = Subscription::new();
    s.add(td("first"));
    s.add(Teardown::fallible(|| Err("bang".into())));
    s.add(td("last"));
    let err = s.unsubscribe().unwrap_err();
    assert_eq!(err.errors().len(), 1);
    assert_eq!(err.errors()[0].to_string(), "bang");
    assert_eq!(*log.borrow(), vec!["first", "last"]);
  }

  #[test]
  fn child_errors_flatten_into_composite() {
    let parent = Subscription::new();
    let child = Subscription::new();
    child.add(Teardown::fallible(|| Err("inner".into())));
    parent.add(Teardown::fallible(|| Err("outer".into())));
    parent.add(child);
    let err = parent.unsubscribe().unwrap_err();
    let messages: Vec<String> = err.errors().iter().map(|e| e.to_string()).collect();
    assert_eq!(messages, vec!["outer", "inner"]);
    assert!(child.is_closed());
  }

  #[test]
  fn pre_closed_handle() {
    let s = Subscription::closed();
    assert!(s.is_closed());
    let (log, td) = probe();
    s.add(td("now"));
    assert_eq!(*log.borrow(), vec!["now"]);
    s.unsubscribe().unwrap();
  }

  #[test]
  fn add_after_close_runs_immediately() {
    let (log, td) = probe();
    let s = Subscription::new();
    s.unsubscribe().unwrap();
    let handle = s.add(td("late"));
    assert_eq!(*log.borrow(), vec!["late"]);
    assert_eq!(handle, TeardownHandle::noop());
  }

  #[test]
  fn add_closed_child_is_dropped() {
    let parent = Subscription::new();
    let child = Subscription::new();
    child.unsubscribe().unwrap();
    parent.add(child);
    assert_eq!(parent.teardown_count(), 0);
  }

  #[test]
  fn closing_parent_closes_children() {
    let parent = Subscription::new();
    let child = Subscription::new();
    parent.add(child);
    parent.unsubscribe().unwrap();
    assert!(child.is_closed());
  }

  #[test]
  fn child_detaches_itself_on_independent_close() {
    let parent = Subscription::new();
    let child = Subscription::new();
    parent.add(child);
    assert_eq!(parent.teardown_count(), 1);
    child.unsubscribe().unwrap();
    assert_eq!(parent.teardown_count(), 0);
    parent.unsubscribe().unwrap();
  }

  #[test]
  fn ownership_is_exclusive() {
    let first = Subscription::new();
    let second = Subscription::new();
    let child = Subscription::new();
    first.add(child);
    second.add(child);
    assert_eq!(first.teardown_count(), 0);
    assert_eq!(second.teardown_count(), 1);
    first.unsubscribe().unwrap();
    assert!(!child.is_closed());
    second.unsubscribe().unwrap();
    assert!(child.is_closed());
  }

  #[test]
  fn remove_skips_execution() {
    let (log, td) = probe();
    let s = Subscription::new();
    let handle = s.add(td("removed"));
    s.add(td("kept"));
    s.remove(handle);
    s.unsubscribe().unwrap();
    assert_eq!(*log.borrow(), vec!["kept"]);
  }

  #[test]
  fn remove_child_detaches_without_closing() {
    let parent = Subscription::new();
    let child = Subscription::new();
    let handle = parent.add(child);
    parent.remove(handle);
    parent.unsubscribe().unwrap();
    assert!(!child.is_closed());
    child.unsubscribe().unwrap();
  }

  #[test]
  fn add_self_is_ignored() {
    let s = Subscription::new();
    s.add(s);
    assert_eq!(s.teardown_count(), 0);
    s.unsubscribe().unwrap();
  }

  #[test]
  fn closed_is_visible_during_teardown() {
    let s = Subscription::new();
    let observed = Rc::new(RefCell::new(None));
    let o = observed.clone();
    s.add(Teardown::action(move || {
      *o.borrow_mut() = Some(s.is_closed());
    }));
    s.unsubscribe().unwrap();
    assert_eq!(*observed.borrow(), Some(true));
  }

  #[test]
  fn guard_unsubscribes_on_drop() {
    let s = Subscription::new();
    {
      let _guard = s.unsubscribe_when_dropped();
      assert!(!s.is_closed());
    }
    assert!(s.is_closed());
  }
}
