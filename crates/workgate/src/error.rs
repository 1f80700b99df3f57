//! Error types for executors and chunk workers.
//!
//! Errors fall into three groups:
//!
//! - **Configuration**: invalid constructor arguments. They are returned
//!   synchronously by the constructor and never reach the concurrent
//!   machinery.
//! - **Execution**: an accepted operation returned an error, panicked, or its
//!   task could not be started.
//! - **Abort**: a manual [`Executor::abort`] or a fired parent signal.
//!
//! Execution and abort errors compete for a single terminal slot. Only the
//! first one is ever recorded, and it is surfaced exclusively through `wait`.
//!
//! [`Executor::abort`]: crate::Executor::abort

use std::sync::Arc;

/// A boxed, thread-safe error returned by a submitted operation.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `workgate` can produce.
///
/// `Error` is [`Clone`] so the recorded terminal error can be handed to every
/// caller of `wait`, no matter how many times it is called.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The admission queue was configured with zero capacity.
    #[error("queue size must be bigger than 0")]
    QueueSize,

    /// The chunk worker was configured with a chunk size of zero.
    #[error("chunk size can not be smaller than 1")]
    ChunkSize,

    /// The chunk worker was built without a processing function.
    #[error("given function is nil")]
    MissingFunc,

    /// An accepted operation returned an error.
    #[error(transparent)]
    Execution(Arc<dyn core::error::Error + Send + Sync + 'static>),

    /// An accepted operation panicked. Carries the panic message when it was a
    /// string.
    #[error("operation panicked: {0}")]
    Panicked(String),

    /// A thread for the coordinator or a fan-out task could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(Arc<std::io::Error>),

    /// [`Executor::abort`](crate::Executor::abort) was called.
    #[error("aborted manually")]
    Aborted,

    /// The parent signal fired before the executor finished.
    #[error("cancelled by parent")]
    Cancelled,
}

impl Error {
    /// Returns `true` for errors caused by invalid constructor arguments.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::QueueSize | Self::ChunkSize | Self::MissingFunc)
    }

    /// Returns `true` when the executor was stopped from the outside rather
    /// than by a failing operation.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted | Self::Cancelled)
    }

    pub(crate) fn execution(err: BoxError) -> Self {
        Self::Execution(Arc::from(err))
    }

    pub(crate) fn panicked(payload: &(dyn core::any::Any + Send)) -> Self {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("non-string panic payload"));
        Self::Panicked(msg)
    }

    pub(crate) fn spawn(err: std::io::Error) -> Self {
        Self::Spawn(Arc::new(err))
    }
}
