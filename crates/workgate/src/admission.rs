use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Debug, Default)]
struct Slots {
    held: usize,
    pending: usize,
}

/// A bounded counting semaphore with a drain wait.
///
/// Each admitted unit of work holds one slot from [`Self::acquire`] until the
/// matching [`Self::release`]. When all slots are held, `acquire` blocks: this
/// is the executor's only backpressure point.
///
/// [`Self::wait_drained`] blocks until no slot is held *and* no caller is
/// blocked in `acquire`, so work that was about to be admitted is not missed.
///
/// # Example
///
/// ```
/// use workgate::AdmissionQueue;
///
/// let queue = AdmissionQueue::new(2).unwrap();
/// queue.acquire();
/// assert!(queue.try_acquire());
/// assert!(!queue.try_acquire());
/// queue.release();
/// queue.release();
/// queue.wait_drained();
/// ```
#[derive(Debug)]
pub struct AdmissionQueue {
    capacity: usize,
    slots: Mutex<Slots>,
    freed: Condvar,
    drained: Condvar,
}

impl AdmissionQueue {
    /// Creates a queue with `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueSize`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::QueueSize);
        }
        Ok(Self {
            capacity,
            slots: Mutex::new(Slots::default()),
            freed: Condvar::new(),
            drained: Condvar::new(),
        })
    }

    /// Takes one slot, blocking while the queue is at capacity.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn acquire(&self) {
        let mut slots = self.slots.lock();
        if slots.held >= self.capacity {
            slots.pending += 1;
            while slots.held >= self.capacity {
                self.freed.wait(&mut slots);
            }
            slots.pending -= 1;
        }
        slots.held += 1;
    }

    /// Takes one slot if one is free, without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut slots = self.slots.lock();
        if slots.held >= self.capacity {
            return false;
        }
        slots.held += 1;
        true
    }

    /// Returns one slot to the queue.
    pub fn release(&self) {
        let mut slots = self.slots.lock();
        debug_assert!(slots.held > 0, "released a slot that was never acquired");
        slots.held = slots.held.saturating_sub(1);
        if slots.pending > 0 {
            self.freed.notify_one();
        } else if slots.held == 0 {
            self.drained.notify_all();
        }
    }

    /// Blocks until no slot is held and no caller is waiting in
    /// [`Self::acquire`].
    pub fn wait_drained(&self) {
        let mut slots = self.slots.lock();
        while slots.held > 0 || slots.pending > 0 {
            self.drained.wait(&mut slots);
        }
    }

    /// Maximum number of slots.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held.
    pub fn held(&self) -> usize {
        self.slots.lock().held
    }

    /// Number of callers currently blocked in [`Self::acquire`].
    pub fn pending(&self) -> usize {
        self.slots.lock().pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = AdmissionQueue::new(0).unwrap_err();
        assert_eq!(err.to_string(), "queue size must be bigger than 0");
    }

    #[test]
    fn acquire_blocks_at_capacity() {
        let queue = Arc::new(AdmissionQueue::new(1).unwrap());
        queue.acquire();

        let admitted = Arc::new(AtomicBool::new(false));
        let waiter = {
            let queue = Arc::clone(&queue);
            let admitted = Arc::clone(&admitted);
            thread::spawn(move || {
                queue.acquire();
                admitted.store(true, Ordering::SeqCst);
            })
        };

        while queue.pending() == 0 {
            thread::yield_now();
        }
        assert!(!admitted.load(Ordering::SeqCst));

        queue.release();
        waiter.join().unwrap();
        assert!(admitted.load(Ordering::SeqCst));
        assert_eq!(queue.held(), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn wait_drained_returns_immediately_when_idle() {
        let queue = AdmissionQueue::new(3).unwrap();
        queue.wait_drained();
        assert_eq!(queue.capacity(), 3);
    }

    #[test]
    fn wait_drained_waits_for_pending_acquires() {
        let queue = Arc::new(AdmissionQueue::new(1).unwrap());
        queue.acquire();

        let second = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                queue.acquire();
                thread::sleep(Duration::from_millis(20));
                queue.release();
            })
        };
        while queue.pending() == 0 {
            thread::yield_now();
        }

        let drainer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_drained())
        };

        // Releasing the first slot hands it to the pending acquire; the drain
        // must keep waiting for that one as well.
        queue.release();
        second.join().unwrap();
        drainer.join().unwrap();
        assert_eq!(queue.held(), 0);
    }
}
