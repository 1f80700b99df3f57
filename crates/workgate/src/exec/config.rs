use super::Executor;
use crate::{Result, Signal};

/// Static configuration for an [`Executor`].
///
/// | Field | Default |
/// |-------|---------|
/// | `queue_size` | `1` |
/// | `fan_out` | `false` (serialized) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExecutorConfig {
    /// Number of admission slots: the upper bound on operations that are
    /// admitted but not yet finished.
    pub queue_size: usize,
    /// Run each admitted operation on its own thread instead of on the
    /// coordinator.
    pub fan_out: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            queue_size: 1,
            fan_out: false,
        }
    }
}

/// Builder for an [`Executor`].
///
/// # Example
///
/// ```
/// use workgate::Executor;
///
/// let executor = Executor::builder().queue_size(4).fan_out(true).build().unwrap();
/// executor.submit(|| Ok::<_, std::io::Error>(()));
/// executor.wait().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutorBuilder {
    config: ExecutorConfig,
    parent: Option<Signal>,
}

impl ExecutorBuilder {
    /// Returns a builder with [`ExecutorConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            parent: None,
        }
    }

    /// Sets the number of admission slots.
    pub fn queue_size(mut self, queue_size: usize) -> Self {
        self.config.queue_size = queue_size;
        self
    }

    /// Selects fan-out (`true`) or serialized (`false`) execution.
    pub fn fan_out(mut self, fan_out: bool) -> Self {
        self.config.fan_out = fan_out;
        self
    }

    /// Cancels the executor with [`Error::Cancelled`](crate::Error::Cancelled)
    /// when `parent` fires.
    pub fn parent(mut self, parent: Signal) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The configuration collected so far.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Starts the coordinator and returns the executor.
    ///
    /// # Errors
    ///
    /// - [`Error::QueueSize`](crate::Error::QueueSize) if `queue_size` is zero.
    /// - [`Error::Spawn`](crate::Error::Spawn) if the coordinator thread could
    ///   not be started.
    pub fn build(self) -> Result<Executor> {
        Executor::start(self.config, self.parent)
    }
}
