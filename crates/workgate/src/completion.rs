use crate::{Result, Signal};

/// Common completion surface of [`Executor`] and [`ChunkWorker`].
///
/// The async runtime extensions are implemented for every `Completion`.
///
/// [`Executor`]: crate::Executor
/// [`ChunkWorker`]: crate::ChunkWorker
pub trait Completion: Clone + Send + Sync + 'static {
    /// Blocks until the work is finished or aborted and returns the recorded
    /// terminal error.
    ///
    /// # Errors
    ///
    /// The first failure or abort that stopped the work.
    fn wait(&self) -> Result<()>;

    /// A signal that fires once the coordinator has exited.
    fn done(&self) -> Signal;

    /// Aborts the work with [`Error::Aborted`](crate::Error::Aborted).
    fn abort(&self);
}

impl Completion for crate::Executor {
    fn wait(&self) -> Result<()> {
        Self::wait(self)
    }

    fn done(&self) -> Signal {
        Self::done(self)
    }

    fn abort(&self) {
        Self::abort(self)
    }
}

impl<V: crate::Values> Completion for crate::ChunkWorker<V> {
    fn wait(&self) -> Result<()> {
        Self::wait(self)
    }

    fn done(&self) -> Signal {
        Self::done(self)
    }

    fn abort(&self) {
        Self::abort(self)
    }
}
