//! Convenience re-exports of the whole public surface.

// Creation functions
pub use crate::observable::{
  create, empty, from_iter, never, of, throw, BoxObservable, Create, Empty, FromIter, Never, Of,
  Throw,
};
// Core traits
pub use crate::observable::{Observable, ObservableExt};
// Observer contract
pub use crate::observer::{Observer, PartialObserver};
// Operators with a free-function surface
pub use crate::ops::on_error_resume_next::on_error_resume_next;
// Scheduling
pub use crate::scheduler::{FlushError, QueueScheduler, Scheduler, TaskState, WorkError};
// Multicast
pub use crate::subject::Subject;
// Subscriber
pub use crate::subscriber::Subscriber;
// Subscription tree
pub use crate::subscription::{
  Subscription, SubscriptionGuard, SubscriptionLike, Teardown, TeardownError, TeardownHandle,
  UnsubscribeError,
};
// Unhandled-error channel
pub use crate::unhandled::UnhandledError;
