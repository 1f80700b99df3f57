use super::{ChunkConfig, Values};
use crate::{BoxError, Error, Executor, ExecutorBuilder, Result, Signal};
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// The processing function applied to each chunk.
pub type ChunkFn<V> = Arc<dyn Fn(V) -> Result<(), BoxError> + Send + Sync + 'static>;

struct Inner<V: Values> {
    /// `None` is the neutral buffer.
    buffer: Mutex<Option<V>>,
    executor: Executor,
    func: ChunkFn<V>,
    chunk_size: usize,
}

/// Batches incrementally fed [`Values`] into fixed-size chunks and runs a
/// function on each chunk through an [`Executor`].
///
/// Every [`ChunkWorker::feed`] appends to an internal buffer. As soon as the
/// buffer holds at least `chunk_size` elements, full chunks are carved off the
/// front and submitted, so processing runs in the background while the
/// producer keeps feeding. Up to `queue_size` chunks can be admitted at once;
/// beyond that, `feed` blocks.
///
/// [`ChunkWorker::wait`] flushes what is left as one final, possibly shorter,
/// chunk and then waits on the executor. Feed nothing after `wait`.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use workgate::ChunkWorker;
///
/// let chunks = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&chunks);
/// let worker = ChunkWorker::new(3, 2, move |chunk: Vec<u32>| {
///     sink.lock().unwrap().push(chunk);
///     Ok::<_, std::io::Error>(())
/// })
/// .unwrap();
///
/// worker.feed(vec![1, 2]);
/// worker.feed(vec![3, 4, 5, 6, 7]);
/// worker.wait().unwrap();
///
/// assert_eq!(
///     *chunks.lock().unwrap(),
///     vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]
/// );
/// ```
pub struct ChunkWorker<V: Values> {
    inner: Arc<Inner<V>>,
}

impl<V: Values> Clone for ChunkWorker<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Values> ChunkWorker<V> {
    /// Creates a serialized chunk worker.
    ///
    /// # Errors
    ///
    /// - [`Error::ChunkSize`] if `chunk_size` is zero.
    /// - [`Error::QueueSize`] if `queue_size` is zero.
    /// - [`Error::Spawn`] if the coordinator thread could not be started.
    pub fn new<F, E>(chunk_size: usize, queue_size: usize, func: F) -> Result<Self>
    where
        F: Fn(V) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::builder()
            .chunk_size(chunk_size)
            .queue_size(queue_size)
            .func(func)
            .build()
    }

    /// Returns a builder with default configuration and no function.
    pub fn builder() -> ChunkWorkerBuilder<V> {
        ChunkWorkerBuilder::new()
    }

    /// Appends `values` to the buffer and submits every full chunk.
    ///
    /// Empty input is ignored. Chunks produced by one caller's sequence of
    /// feeds keep that caller's order; concurrent feeders are serialized but
    /// their relative order is unspecified.
    ///
    /// This does not check whether the executor is still accepting: after an
    /// abort, chunks are still carved and silently dropped. The failure is
    /// reported by [`ChunkWorker::wait`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn feed(&self, values: V) {
        if values.is_empty() {
            return;
        }

        let inner = &*self.inner;
        let mut buffer = inner.buffer.lock();
        let merged = match buffer.take() {
            Some(held) => held.merge(values),
            None => values,
        };

        let len = merged.len();
        let mut start = 0;
        while len - start >= inner.chunk_size {
            self.submit(merged.range(start, start + inner.chunk_size));
            start += inner.chunk_size;
        }

        *buffer = match start {
            0 => Some(merged),
            _ if start == len => None,
            _ => Some(merged.range(start, len)),
        };
    }

    /// Submits the buffered remainder as a final chunk, then waits on the
    /// executor and returns its terminal error.
    ///
    /// Calling this again flushes nothing and returns the same result.
    ///
    /// # Errors
    ///
    /// The first failure or abort that stopped the executor.
    pub fn wait(&self) -> Result<()> {
        let inner = &*self.inner;
        let mut buffer = inner.buffer.lock();
        if let Some(rest) = buffer.take() {
            if !rest.is_empty() {
                #[cfg(feature = "tracing")]
                tracing::trace!(len = rest.len(), "flushing final chunk");
                self.submit(rest);
            }
        }
        inner.executor.wait()
    }

    fn submit(&self, chunk: V) {
        #[cfg(feature = "tracing")]
        tracing::trace!(len = chunk.len(), "submitting chunk");
        let func = Arc::clone(&self.inner.func);
        self.inner.executor.submit(move || func(chunk));
    }

    /// Switches the underlying executor to fan-out mode. See
    /// [`Executor::fan_out`].
    pub fn fan_out(&self) {
        self.inner.executor.fan_out();
    }

    /// See [`Executor::done`].
    pub fn done(&self) -> Signal {
        self.inner.executor.done()
    }

    /// See [`Executor::abort`].
    pub fn abort(&self) {
        self.inner.executor.abort();
    }

    /// The underlying executor.
    pub fn executor(&self) -> &Executor {
        &self.inner.executor
    }

    /// Number of elements fed but not yet submitted.
    ///
    /// This takes the buffer lock, which [`ChunkWorker::wait`] holds for the
    /// whole drain. Calling it from inside the chunk function while `wait`
    /// runs deadlocks in serialized mode.
    pub fn buffered(&self) -> usize {
        self.inner.buffer.lock().as_ref().map_or(0, Values::len)
    }

    /// The configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.inner.chunk_size
    }
}

impl<V: Values> fmt::Debug for ChunkWorker<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ChunkWorker");
        s.field("chunk_size", &self.chunk_size());
        // `wait` keeps the buffer locked while draining.
        match self.inner.buffer.try_lock() {
            Some(buffer) => s.field("buffered", &buffer.as_ref().map_or(0, Values::len)),
            None => s.field("buffered", &format_args!("<locked>")),
        };
        s.field("executor", &self.inner.executor).finish()
    }
}

/// Builder for a [`ChunkWorker`].
///
/// # Example
///
/// ```
/// use workgate::ChunkWorker;
///
/// let worker = ChunkWorker::builder()
///     .chunk_size(64)
///     .queue_size(4)
///     .fan_out(true)
///     .func(|chunk: Vec<u8>| {
///         assert!(chunk.len() <= 64);
///         Ok::<_, std::io::Error>(())
///     })
///     .build()
///     .unwrap();
/// worker.feed(vec![0; 200]);
/// worker.wait().unwrap();
/// ```
pub struct ChunkWorkerBuilder<V: Values> {
    config: ChunkConfig,
    parent: Option<Signal>,
    func: Option<ChunkFn<V>>,
}

impl<V: Values> Default for ChunkWorkerBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Values> ChunkWorkerBuilder<V> {
    /// Returns a builder with [`ChunkConfig::default`] and no function.
    pub fn new() -> Self {
        Self::from_config(ChunkConfig::default())
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ChunkConfig) -> Self {
        Self {
            config,
            parent: None,
            func: None,
        }
    }

    /// Sets the number of elements per chunk.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Sets how many chunks may be admitted at once.
    pub fn queue_size(mut self, queue_size: usize) -> Self {
        self.config.executor.queue_size = queue_size;
        self
    }

    /// Selects fan-out (`true`) or serialized (`false`) execution.
    pub fn fan_out(mut self, fan_out: bool) -> Self {
        self.config.executor.fan_out = fan_out;
        self
    }

    /// Cancels the worker when `parent` fires.
    pub fn parent(mut self, parent: Signal) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the function run on each chunk.
    pub fn func<F, E>(mut self, func: F) -> Self
    where
        F: Fn(V) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.func = Some(Arc::new(move |chunk: V| -> Result<(), BoxError> {
            func(chunk).map_err(Into::into)
        }));
        self
    }

    /// Sets an already type-erased chunk function, or clears it with `None`.
    pub fn func_arc(mut self, func: Option<ChunkFn<V>>) -> Self {
        self.func = func;
        self
    }

    /// The configuration collected so far.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Validates the configuration and starts the underlying executor.
    ///
    /// Checks run in order: chunk size, function, then queue size.
    ///
    /// # Errors
    ///
    /// - [`Error::ChunkSize`] if `chunk_size` is zero.
    /// - [`Error::MissingFunc`] if no function was set.
    /// - [`Error::QueueSize`] if `queue_size` is zero.
    /// - [`Error::Spawn`] if the coordinator thread could not be started.
    pub fn build(self) -> Result<ChunkWorker<V>> {
        if self.config.chunk_size < 1 {
            return Err(Error::ChunkSize);
        }
        let func = self.func.ok_or(Error::MissingFunc)?;

        let mut executor = ExecutorBuilder::from_config(self.config.executor);
        if let Some(parent) = self.parent {
            executor = executor.parent(parent);
        }
        let executor = executor.build()?;

        Ok(ChunkWorker {
            inner: Arc::new(Inner {
                buffer: Mutex::new(None),
                executor,
                func,
                chunk_size: self.config.chunk_size,
            }),
        })
    }
}
