use crate::Error;
use parking_lot::RwLock;
use portable_atomic::{AtomicBool, Ordering};

/// Lifecycle phase of an [`Executor`](crate::Executor).
///
/// An executor starts in [`Phase::Accepting`] and leaves it exactly once,
/// either to [`Phase::Draining`] (on `wait`) or directly to
/// [`Phase::Aborted`]. A graceful drain ends in [`Phase::Done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// New operations are admitted.
    Accepting,
    /// `wait` was called; admitted work is finishing, new work is dropped.
    Draining,
    /// An operation failed or the executor was aborted.
    Aborted,
    /// All admitted work finished and the coordinator was told to exit.
    Done,
}

impl Phase {
    /// Returns `true` for [`Phase::Aborted`] and [`Phase::Done`].
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted | Self::Done)
    }
}

/// A consistent `{phase, error}` pair.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// The terminal error. Only set once the phase is [`Phase::Aborted`].
    pub error: Option<Error>,
}

impl Snapshot {
    pub(crate) const fn new(phase: Phase) -> Self {
        Self { phase, error: None }
    }

    pub(crate) const fn aborted(error: Error) -> Self {
        Self {
            phase: Phase::Aborted,
            error: Some(error),
        }
    }
}

/// Holds the current [`Snapshot`] behind a read/write lock.
///
/// Readers always see a fully written pair; writers replace the whole pair.
#[derive(Debug)]
pub(crate) struct StateHolder {
    snapshot: RwLock<Snapshot>,
}

impl StateHolder {
    pub(crate) fn new(initial: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(initial),
        }
    }

    pub(crate) fn load(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    pub(crate) fn store(&self, snapshot: Snapshot) {
        *self.snapshot.write() = snapshot;
    }

    /// Replaces the snapshot with `next` only while the phase is still
    /// `expected`. Returns whether the write happened.
    pub(crate) fn transition(&self, expected: Phase, next: Snapshot) -> bool {
        let mut snapshot = self.snapshot.write();
        if snapshot.phase != expected {
            return false;
        }
        *snapshot = next;
        true
    }

    pub(crate) fn phase(&self) -> Phase {
        self.snapshot.read().phase
    }

    pub(crate) fn error(&self) -> Option<Error> {
        self.snapshot.read().error.clone()
    }

    pub(crate) fn has_error(&self) -> bool {
        self.snapshot.read().error.is_some()
    }
}

/// A one-time latch: the first caller of [`Latch::try_fire`] wins.
#[derive(Debug)]
pub(crate) struct Latch {
    #[cfg(feature = "cache-padded")]
    fired: crossbeam_utils::CachePadded<AtomicBool>,
    #[cfg(not(feature = "cache-padded"))]
    fired: AtomicBool,
}

impl Latch {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            fired: crossbeam_utils::CachePadded::new(AtomicBool::new(false)),
            #[cfg(not(feature = "cache-padded"))]
            fired: AtomicBool::new(false),
        }
    }

    /// Returns `true` for exactly one caller over the latch's lifetime.
    pub(crate) fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
