use std::time::Duration;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutRc,
  scheduler::{Scheduler, TaskState},
  subscriber::Subscriber,
  subscription::Subscription,
  unhandled,
};

/// Reschedules `next` and `complete` onto a [`Scheduler`] with a fixed
/// delay. `error` is forwarded immediately: an upstream failure does not
/// queue behind values still in flight. Pending deliveries are cancelled
/// when the consumer unsubscribes.
#[derive(Clone)]
pub struct DelayOp<S, Sch> {
  source: S,
  delay: Duration,
  scheduler: Sch,
}

impl<S, Sch> DelayOp<S, Sch> {
  #[inline]
  pub(crate) fn new(source: S, delay: Duration, scheduler: Sch) -> Self {
    DelayOp { source, delay, scheduler }
  }
}

impl<Item, Err, S, Sch> Observable<Item, Err> for DelayOp<S, Sch>
where
  S: Observable<Item, Err>,
  Sch: Scheduler + 'static,
  Item: 'static,
  Err: 'static,
{
  fn actual_subscribe(self, subscriber: Subscriber<Item, Err>) {
    let DelayOp { source, delay, scheduler } = self;
    let destination_subscription = subscriber.subscription();
    let upstream = Subscriber::new(DelayObserver {
      destination: MutRc::own(subscriber),
      destination_subscription,
      delay,
      scheduler,
    });
    destination_subscription.add(upstream.subscription());
    source.actual_subscribe(upstream);
  }
}

struct DelayObserver<Item, Err, Sch> {
  destination: MutRc<Subscriber<Item, Err>>,
  destination_subscription: Subscription,
  delay: Duration,
  scheduler: Sch,
}

impl<Item, Err, Sch> DelayObserver<Item, Err, Sch>
where
  Sch: Scheduler,
  Item: 'static,
  Err: 'static,
{
  fn defer(&mut self, notification: impl FnOnce(&mut Subscriber<Item, Err>) + 'static) {
    let destination = self.destination.clone();
    let mut pending = Some(notification);
    let scheduled = self.scheduler.schedule(self.delay, move || {
      if let Some(deliver) = pending.take() {
        deliver(&mut destination.borrow_mut());
      }
      Ok(TaskState::Finished)
    });
    match scheduled {
      Ok(handle) => {
        self.destination_subscription.add(handle);
      }
      Err(err) => unhandled::report(err),
    }
  }
}

impl<Item, Err, Sch> Observer<Item, Err> for DelayObserver<Item, Err, Sch>
where
  Sch: Scheduler,
  Item: 'static,
  Err: 'static,
{
  fn next(&mut self, value: Item) {
    let mut value = Some(value);
    self.defer(move |destination| {
      if let Some(value) = value.take() {
        destination.next(value);
      }
    });
  }

  fn error(&mut self, err: Err) { self.destination.borrow_mut().error(err) }

  fn complete(&mut self) { self.defer(|destination| destination.complete()) }

  fn is_stopped(&self) -> bool { self.destination.borrow().is_stopped() }

  fn can_report(&self) -> bool { self.destination.borrow().can_report() }
}
