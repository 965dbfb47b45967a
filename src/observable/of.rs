use crate::{observable::Observable, observer::Observer, subscriber::Subscriber, type_hint::TypeHint};

/// Emit a single value, then complete.
pub fn of<Item, Err>(value: Item) -> Of<Item, Err> { Of { value, _hint: TypeHint::new() } }

#[derive(Clone)]
pub struct Of<Item, Err> {
  value: Item,
  _hint: TypeHint<Err>,
}

impl<Item, Err: 'static> Observable<Item, Err> for Of<Item, Err> {
  fn actual_subscribe(self, mut subscriber: Subscriber<Item, Err>) {
    subscriber.next(self.value);
    subscriber.complete();
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  #[test]
  fn single_value_then_complete() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    of::<_, Infallible>(100).subscribe_all(
      move |v| l.borrow_mut().push(("next", v)),
      |_| {},
      || {},
    );
    assert_eq!(*log.borrow(), vec![("next", 100)]);
  }
}
