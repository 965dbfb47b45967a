//! Cooperative scheduling: ordering work by due time with controlled
//! reentrancy.
//!
//! [`QueueScheduler`] is the queue-based reference model. Scheduling while
//! idle starts a flush that drains every due action; scheduling from inside
//! a running action only enqueues, and the already-running flush loop picks
//! the action up, so recursive self-scheduling never grows the call stack. Due
//! time is virtual and advanced explicitly ([`QueueScheduler::advance_by`] /
//! [`QueueScheduler::flush`]); variants with an external time source only
//! differ in what makes the due time elapse.

use std::{cmp::Ordering, collections::BinaryHeap, mem, time::Duration};

use thiserror::Error;

use crate::{
  rc::MutRc,
  subscription::{Subscription, SubscriptionLike},
  unhandled,
};

/// Error type a scheduled action may fail with.
pub type WorkError = Box<dyn std::error::Error + 'static>;

/// What a scheduled action wants next: to be done, or to run again after a
/// delay.
pub enum TaskState {
  Finished,
  Reschedule(Duration),
}

/// Raised from the `schedule` (or advance) call whose flush executed a
/// failing action. The scheduler is back to idle with an empty queue by the
/// time this is returned.
#[derive(Debug, Error)]
#[error("scheduled action failed: {0}")]
pub struct FlushError(WorkError);

impl FlushError {
  pub fn into_work_error(self) -> WorkError { self.0 }
}

/// Where and when a unit of work executes.
///
/// `schedule` must not run `work` before `delay` has elapsed, must run
/// actions of equal due time in FIFO order, must bound stack depth under
/// recursive scheduling, and must stay usable after an action fails. The
/// returned [`Subscription`] cancels the pending action.
pub trait Scheduler {
  fn schedule<F>(&self, delay: Duration, work: F) -> Result<Subscription, FlushError>
  where
    F: FnMut() -> Result<TaskState, WorkError> + 'static;

  /// Elapsed time on this scheduler's clock.
  fn now(&self) -> Duration;
}

struct ScheduledAction {
  due: Duration,
  sequence: u64,
  handle: Subscription,
  work: Box<dyn FnMut() -> Result<TaskState, WorkError>>,
}

impl PartialEq for ScheduledAction {
  fn eq(&self, other: &Self) -> bool {
    self.due == other.due && self.sequence == other.sequence
  }
}

impl Eq for ScheduledAction {}

impl PartialOrd for ScheduledAction {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledAction {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earliest due first, FIFO among equal due times.
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.sequence.cmp(&self.sequence))
  }
}

#[derive(Default)]
struct QueueState {
  clock: Duration,
  flushing: bool,
  sequence: u64,
  queue: BinaryHeap<ScheduledAction>,
}

/// The queue-based reference scheduler: a virtual clock, an action queue
/// ordered by `(due, enqueue order)`, and a flush guard for reentrancy.
#[derive(Clone, Default)]
pub struct QueueScheduler {
  state: MutRc<QueueState>,
}

impl QueueScheduler {
  pub fn new() -> Self { QueueScheduler::default() }

  /// Advance the clock by `duration`, executing every action that falls due
  /// on the way, in due-time order. Not for use from inside an action.
  pub fn advance_by(&self, duration: Duration) -> Result<(), FlushError> {
    let target = self.state.borrow().clock + duration;
    let result = self.run_due(target);
    {
      let mut state = self.state.borrow_mut();
      state.clock = state.clock.max(target);
    }
    result
  }

  /// Run every pending action, advancing the clock to each action's due
  /// time, until the queue is empty.
  pub fn flush(&self) -> Result<(), FlushError> { self.run_due(Duration::MAX) }

  pub fn pending_count(&self) -> usize { self.state.borrow().queue.len() }

  fn run_due(&self, limit: Duration) -> Result<(), FlushError> {
    {
      let mut state = self.state.borrow_mut();
      if state.flushing {
        // Reentrant entry: the outer flush loop owns the queue.
        return Ok(());
      }
      state.flushing = true;
    }
    loop {
      let action = {
        let mut state = self.state.borrow_mut();
        let due = state.queue.peek().map(|a| a.due);
        match due {
          Some(due) if due <= limit => {
            let action = state.queue.pop();
            if let Some(action) = &action {
              state.clock = state.clock.max(action.due);
            }
            action
          }
          _ => None,
        }
      };
      let Some(mut action) = action else { break };
      if action.handle.is_closed() {
        continue;
      }
      match (action.work)() {
        Ok(TaskState::Finished) => {
          if let Err(err) = action.handle.unsubscribe() {
            unhandled::report(err);
          }
        }
        Ok(TaskState::Reschedule(delay)) => {
          let mut state = self.state.borrow_mut();
          state.sequence += 1;
          let rescheduled = ScheduledAction {
            due: state.clock + delay,
            sequence: state.sequence,
            handle: action.handle,
            work: action.work,
          };
          state.queue.push(rescheduled);
        }
        Err(err) => {
          // Restore a usable scheduler before raising: idle, and nothing
          // left over from the failed flush.
          let abandoned = {
            let mut state = self.state.borrow_mut();
            state.flushing = false;
            mem::take(&mut state.queue)
          };
          if let Err(teardown_err) = action.handle.unsubscribe() {
            unhandled::report(teardown_err);
          }
          for leftover in abandoned {
            if let Err(teardown_err) = leftover.handle.unsubscribe() {
              unhandled::report(teardown_err);
            }
          }
          return Err(FlushError(err));
        }
      }
    }
    self.state.borrow_mut().flushing = false;
    Ok(())
  }
}

impl Scheduler for QueueScheduler {
  fn schedule<F>(&self, delay: Duration, work: F) -> Result<Subscription, FlushError>
  where
    F: FnMut() -> Result<TaskState, WorkError> + 'static,
  {
    let handle = Subscription::new();
    let flush_now = {
      let mut state = self.state.borrow_mut();
      state.sequence += 1;
      let action = ScheduledAction {
        due: state.clock + delay,
        sequence: state.sequence,
        handle,
        work: Box::new(work),
      };
      state.queue.push(action);
      !state.flushing
    };
    if flush_now {
      let clock = self.state.borrow().clock;
      self.run_due(clock)?;
    }
    Ok(handle)
  }

  fn now(&self) -> Duration { self.state.borrow().clock }
}
