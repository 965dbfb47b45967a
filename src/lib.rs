//! # rill: composable push streams
//!
//! Primitives for describing synchronous or deferred sequences of values
//! and composing, transforming, and tearing them down deterministically.
//!
//! ```rust
//! use rill::prelude::*;
//! use std::{cell::RefCell, convert::Infallible, rc::Rc};
//!
//! let evens = Rc::new(RefCell::new(Vec::new()));
//! let sink = evens.clone();
//! from_iter::<_, Infallible>(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| sink.borrow_mut().push(v));
//! assert_eq!(*evens.borrow(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A cold, restartable recipe for a notification sequence |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` notifications |
//! | [`Subscription`] | Tree-shaped handle releasing every owned resource on unsubscribe |
//! | [`Subscriber`] | A Subscription that also receives and forwards notifications |
//! | [`QueueScheduler`] | Reentrancy-safe work queue ordered by due time |
//!
//! Cancellation is synchronous and cascades: closing the handle returned by
//! `subscribe` detaches every operator stage and producer in the chain.
//! Errors nobody handles are never lost: they land on the
//! [`unhandled`] channel.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Subscriber`]: subscriber::Subscriber
//! [`QueueScheduler`]: scheduler::QueueScheduler

pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;
pub mod type_hint;
pub mod unhandled;

// Re-export the prelude module
pub use prelude::*;
