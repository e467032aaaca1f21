//! Fair wait queue of idle connections
//!
//! The queue is plain data that lives inside the pool's mutex. The blocking
//! [`WaitQueue::poll_timeout`] borrows the pool's lock guard and condition
//! variable, so the queue and the rest of the pool state are always guarded
//! by one lock.

use crate::error::PoolError;
use parking_lot::{Condvar, MutexGuard};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// FIFO of idle items with a count of callers blocked waiting for one
#[derive(Debug)]
pub struct WaitQueue<T> {
    /// Idle items, head is handed out first
    items: VecDeque<T>,
    /// Callers currently parked in `poll_timeout`
    num_waiting: usize,
}

impl<T> Default for WaitQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WaitQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty queue with room for `capacity` items
    pub fn with_capacity(capacity: usize) -> Self {
        WaitQueue {
            items: VecDeque::with_capacity(capacity),
            num_waiting: 0,
        }
    }

    /// Number of idle items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no idle items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of callers currently blocked waiting
    pub fn num_waiting(&self) -> usize {
        self.num_waiting
    }

    /// Whether any caller is blocked waiting
    pub fn any_waiting(&self) -> bool {
        self.num_waiting > 0
    }

    /// Append `item` to the tail and wake one waiter. Never blocks.
    pub fn add(&mut self, item: T, cond: &Condvar) {
        self.items.push_back(item);
        cond.notify_one();
    }

    /// Remove the first item matching `is_target`. Returns whether one was found.
    pub fn remove<F>(&mut self, mut is_target: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        match self.items.iter().position(|item| is_target(item)) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every idle item. Callers already waiting are not woken.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate over idle items, head first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Remove the head without blocking
    ///
    /// Only succeeds while idle items outnumber blocked waiters, so a caller
    /// that is not waiting never takes an item out from under one that is.
    pub fn poll(&mut self) -> Option<T> {
        if self.items.len() > self.num_waiting {
            self.items.pop_front()
        } else {
            None
        }
    }

    /// Remove the head, blocking up to `timeout` for one to arrive
    ///
    /// `queue` projects the queue out of the state guarded by `guard`; `cond`
    /// must be the condition variable passed to [`WaitQueue::add`]. The lock is
    /// released while parked.
    pub fn poll_timeout<S>(
        guard: &mut MutexGuard<'_, S>,
        cond: &Condvar,
        timeout: Duration,
        queue: fn(&mut S) -> &mut WaitQueue<T>,
    ) -> Result<T, PoolError> {
        if let Some(item) = queue(&mut **guard).poll() {
            return Ok(item);
        }

        let mut waiter = Waiter::register(guard, queue);
        let start = Instant::now();
        let deadline = start.checked_add(timeout);

        loop {
            waiter.wait_until(cond, deadline);

            if let Some(item) = waiter.queue().items.pop_front() {
                return Ok(item);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(PoolError::Exhausted { timeout, elapsed });
            }
        }
    }
}

/// Registration of one blocked caller; deregisters on every exit path
struct Waiter<'a, 'g, S, T> {
    guard: &'a mut MutexGuard<'g, S>,
    queue: fn(&mut S) -> &mut WaitQueue<T>,
}

impl<'a, 'g, S, T> Waiter<'a, 'g, S, T> {
    fn register(guard: &'a mut MutexGuard<'g, S>, queue: fn(&mut S) -> &mut WaitQueue<T>) -> Self {
        queue(&mut **guard).num_waiting += 1;
        Waiter { guard, queue }
    }

    fn queue(&mut self) -> &mut WaitQueue<T> {
        (self.queue)(&mut **self.guard)
    }

    /// Park until notified or `deadline`; the pool lock is released meanwhile.
    /// `None` means the deadline is past what `Instant` can represent.
    fn wait_until(&mut self, cond: &Condvar, deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => {
                cond.wait_until(&mut *self.guard, deadline);
            }
            None => cond.wait(&mut *self.guard),
        }
    }
}

impl<S, T> Drop for Waiter<'_, '_, S, T> {
    fn drop(&mut self) {
        self.queue().num_waiting -= 1;
    }
}
