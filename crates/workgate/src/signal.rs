//! One-shot broadcast signals.
//!
//! A [`Trigger`] owns the only sender of a zero-capacity channel that never
//! carries a message. Firing the trigger (or dropping it) disconnects the
//! channel, which every cloned [`Signal`] observes at once. The same pair
//! backs both the executor's cancellation token and its done signal.

use core::convert::Infallible;
use core::time::Duration;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use parking_lot::Mutex;

/// Creates a connected [`Trigger`] and [`Signal`].
///
/// # Example
///
/// ```
/// let (trigger, signal) = workgate::signal::pair();
/// assert!(!signal.is_fired());
/// trigger.fire();
/// assert!(signal.is_fired());
/// ```
pub fn pair() -> (Trigger, Signal) {
    let (tx, rx) = bounded(0);
    (
        Trigger {
            tx: Mutex::new(Some(tx)),
        },
        Signal { rx },
    )
}

/// The firing half of a one-shot signal.
///
/// Dropping a trigger fires it.
#[derive(Debug)]
pub struct Trigger {
    tx: Mutex<Option<Sender<Infallible>>>,
}

impl Trigger {
    /// Fires the signal. Idempotent.
    pub fn fire(&self) {
        drop(self.tx.lock().take());
    }

    /// Returns `true` once [`Self::fire`] has been called.
    pub fn is_fired(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// The observing half of a one-shot signal. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Signal {
    rx: Receiver<Infallible>,
}

impl Signal {
    /// Returns `true` if the connected [`Trigger`] has fired.
    pub fn is_fired(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Blocks until the connected [`Trigger`] fires.
    pub fn wait(&self) {
        // The channel carries no values, so `recv` only returns on disconnect.
        let _ = self.rx.recv();
    }

    /// Blocks until the signal fires or `timeout` elapses. Returns `true` if
    /// the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// The underlying receiver, for use in a caller's own
    /// [`crossbeam_channel::select!`].
    ///
    /// The receiver becomes ready (with a disconnect error) once the signal has
    /// fired.
    pub fn receiver(&self) -> &Receiver<Infallible> {
        &self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fire_is_observed_by_all_clones() {
        let (trigger, signal) = pair();
        let other = signal.clone();
        assert!(!trigger.is_fired());
        assert!(!signal.is_fired());

        trigger.fire();
        trigger.fire();

        assert!(trigger.is_fired());
        assert!(signal.is_fired());
        assert!(other.is_fired());
    }

    #[test]
    fn dropping_the_trigger_fires() {
        let (trigger, signal) = pair();
        drop(trigger);
        assert!(signal.is_fired());
    }

    #[test]
    fn wait_unblocks_across_threads() {
        let (trigger, signal) = pair();
        let waiter = thread::spawn(move || signal.wait());
        thread::sleep(Duration::from_millis(20));
        trigger.fire();
        waiter.join().unwrap();
    }

    #[test]
    fn wait_timeout_reports_expiry() {
        let (trigger, signal) = pair();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
        trigger.fire();
        assert!(signal.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn receiver_is_selectable() {
        let (trigger, signal) = pair();
        trigger.fire();
        crossbeam_channel::select! {
            recv(signal.receiver()) -> msg => assert!(msg.is_err()),
            default(Duration::from_secs(1)) => panic!("fired signal was not ready"),
        }
    }
}
