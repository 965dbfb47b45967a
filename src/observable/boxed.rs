use crate::{observable::Observable, subscriber::Subscriber};

/// Object-safe shim behind [`BoxObservable`]; `actual_subscribe` consumes
/// `self` by value, so erasure goes through `Box<Self>`.
trait BoxableObservable<Item, Err> {
  fn box_subscribe(self: Box<Self>, subscriber: Subscriber<Item, Err>);
}

impl<T, Item, Err> BoxableObservable<Item, Err> for T
where
  T: Observable<Item, Err>,
{
  fn box_subscribe(self: Box<Self>, subscriber: Subscriber<Item, Err>) {
    (*self).actual_subscribe(subscriber)
  }
}

/// A type-erased observable, the storage form for heterogeneous source
/// lists such as the ones [`crate::ops::on_error_resume_next`] consumes.
pub struct BoxObservable<Item, Err>(Box<dyn BoxableObservable<Item, Err>>);

impl<Item, Err> BoxObservable<Item, Err> {
  pub fn new(source: impl Observable<Item, Err> + 'static) -> Self {
    BoxObservable(Box::new(source))
  }
}

impl<Item, Err> Observable<Item, Err> for BoxObservable<Item, Err> {
  fn actual_subscribe(self, subscriber: Subscriber<Item, Err>) { self.0.box_subscribe(subscriber) }
}
