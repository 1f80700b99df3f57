use super::{ExecutorBuilder, ExecutorConfig};
use crate::{
    AdmissionQueue, BoxError, Error, Phase, Result, Signal, Snapshot, Trigger,
    signal,
    state::{Latch, StateHolder},
};
use core::{convert::Infallible, fmt};
use crossbeam_channel::{Receiver, Sender, bounded, never, select};
use portable_atomic::{AtomicBool, Ordering};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

const COORDINATOR_THREAD: &str = "workgate-coordinator";
const TASK_THREAD: &str = "workgate-task";

type Operation = Box<dyn FnOnce() -> Result<(), BoxError> + Send + 'static>;

enum Work {
    Run(Operation),
    /// Tells the coordinator to exit after a graceful drain.
    Finish,
}

/// State shared by the handles, the coordinator and fan-out tasks.
struct Core {
    state: StateHolder,
    admission: AdmissionQueue,
    /// First of {drain, failure, abort} to fire fixes the outcome.
    terminal: Latch,
    cancel: Trigger,
    cancelled: Signal,
    fan_out: AtomicBool,
}

impl Core {
    fn abort(&self, err: Error) {
        if self.terminal.try_fire() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, "executor aborted");
            self.state.store(Snapshot::aborted(err));
            self.cancel.fire();
        }
    }

    fn execute(&self, op: Operation) {
        match panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.abort(Error::execution(err)),
            Err(payload) => self.abort(Error::panicked(&*payload)),
        }
    }
}

/// Runs an admitted operation according to the current mode. The admission
/// slot is released once the operation has finished or was skipped.
fn dispatch(core: &Arc<Core>, op: Operation) {
    if core.fan_out.load(Ordering::Acquire) {
        let task = Arc::clone(core);
        let spawned = thread::Builder::new()
            .name(TASK_THREAD.into())
            .spawn(move || {
                // A sibling may have failed while this task was queued.
                if !task.state.has_error() {
                    task.execute(op);
                }
                task.admission.release();
            });
        if let Err(err) = spawned {
            core.admission.release();
            core.abort(Error::spawn(err));
        }
    } else {
        if !core.state.has_error() {
            core.execute(op);
        }
        core.admission.release();
    }
}

/// The coordinator loop. Exactly one runs per executor.
///
/// Exits when the cancellation token fires, the parent fires, the `Finish`
/// marker arrives, or every handle has been dropped. `done` fires on exit,
/// including when unwinding.
fn coordinate(core: Arc<Core>, work: Receiver<Work>, parent: Receiver<Infallible>, done: Trigger) {
    let _done = done;
    let cancelled = core.cancelled.receiver().clone();

    #[cfg(feature = "tracing")]
    tracing::debug!("coordinator started");

    loop {
        select! {
            recv(cancelled) -> _ => break,
            recv(parent) -> _ => {
                core.abort(Error::Cancelled);
                break;
            }
            recv(work) -> msg => match msg {
                Ok(Work::Run(op)) => dispatch(&core, op),
                Ok(Work::Finish) | Err(_) => break,
            },
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(phase = ?core.state.phase(), "coordinator stopped");
}

struct Inner {
    core: Arc<Core>,
    work: Sender<Work>,
    done: Signal,
    drain: Latch,
}

/// An admission-controlled executor with first-failure abort.
///
/// Operations submitted with [`Executor::submit`] are bounded by an
/// [`AdmissionQueue`]: once `queue_size` operations are admitted but not
/// finished, `submit` blocks the caller. A single coordinator thread receives
/// admitted operations and either runs them itself, in submission order
/// (serialized mode), or hands each one to a new thread (fan-out mode, see
/// [`Executor::fan_out`]).
///
/// The first failing operation, a call to [`Executor::abort`], or a fired
/// parent signal stops the executor. Later submissions are silently dropped
/// and the recorded error is returned by every call to [`Executor::wait`].
/// Side effects of operations that already ran are not undone.
///
/// `Executor` is a cheap handle; clone it to submit from several threads. If
/// every handle is dropped without calling `wait`, the coordinator exits.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use workgate::Executor;
///
/// let executor = Executor::new(2).unwrap();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// for i in 0..5 {
///     let seen = Arc::clone(&seen);
///     executor.submit(move || {
///         seen.lock().unwrap().push(i);
///         Ok::<_, std::io::Error>(())
///     });
/// }
///
/// executor.wait().unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
/// ```
#[derive(Clone)]
pub struct Executor {
    inner: Arc<Inner>,
}

impl Executor {
    /// Creates a serialized executor with `queue_size` admission slots.
    ///
    /// # Errors
    ///
    /// - [`Error::QueueSize`] if `queue_size` is zero.
    /// - [`Error::Spawn`] if the coordinator thread could not be started.
    pub fn new(queue_size: usize) -> Result<Self> {
        Self::builder().queue_size(queue_size).build()
    }

    /// Creates an executor from a configuration.
    ///
    /// # Errors
    ///
    /// See [`Executor::new`].
    pub fn with_config(config: ExecutorConfig) -> Result<Self> {
        ExecutorBuilder::from_config(config).build()
    }

    /// Returns a builder with default configuration.
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    pub(crate) fn start(config: ExecutorConfig, parent: Option<Signal>) -> Result<Self> {
        let admission = AdmissionQueue::new(config.queue_size)?;
        let (cancel, cancelled) = signal::pair();
        let core = Arc::new(Core {
            state: StateHolder::new(Snapshot::new(Phase::Accepting)),
            admission,
            terminal: Latch::new(),
            cancel,
            cancelled,
            fan_out: AtomicBool::new(config.fan_out),
        });

        let (work_tx, work_rx) = bounded(0);
        let (done_trigger, done) = signal::pair();
        let parent = parent.map_or_else(never, |p| p.receiver().clone());

        let coordinator = Arc::clone(&core);
        thread::Builder::new()
            .name(COORDINATOR_THREAD.into())
            .spawn(move || coordinate(coordinator, work_rx, parent, done_trigger))
            .map_err(Error::spawn)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            queue_size = config.queue_size,
            fan_out = config.fan_out,
            "executor started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                core,
                work: work_tx,
                done,
                drain: Latch::new(),
            }),
        })
    }

    /// Submits an operation.
    ///
    /// While the executor is accepting, this takes one admission slot
    /// (blocking while the queue is full) and hands the operation to the
    /// coordinator. If the coordinator exits before taking it, the slot is
    /// returned and the operation is dropped unexecuted.
    ///
    /// Once the executor is draining, aborted or done, this is a no-op. The
    /// operation is dropped and no error is reported here; the outcome is only
    /// visible through [`Executor::wait`].
    pub fn submit<F, E>(&self, op: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        let inner = &*self.inner;
        let core = &inner.core;
        if core.state.phase() != Phase::Accepting {
            #[cfg(feature = "tracing")]
            tracing::trace!("submission dropped: executor is not accepting");
            return;
        }

        core.admission.acquire();

        let op: Operation = Box::new(move || -> Result<(), BoxError> { op().map_err(Into::into) });
        select! {
            send(inner.work, Work::Run(op)) -> sent => {
                if sent.is_err() {
                    core.admission.release();
                }
            }
            recv(inner.done.receiver()) -> _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!("submission dropped: coordinator already exited");
                core.admission.release();
            }
        }
    }

    /// Switches to fan-out mode: each admitted operation runs on its own
    /// thread, still bounded by the admission queue.
    ///
    /// Call this before submitting. Operations already handed to the
    /// coordinator may run in either mode.
    pub fn fan_out(&self) {
        self.inner.core.fan_out.store(true, Ordering::Release);
    }

    /// Returns `true` if the executor runs operations in fan-out mode.
    pub fn is_fan_out(&self) -> bool {
        self.inner.core.fan_out.load(Ordering::Acquire)
    }

    /// Stops accepting work, waits for all admitted work, and returns the
    /// recorded terminal error.
    ///
    /// Only the first call performs the drain: it moves the executor to
    /// [`Phase::Draining`], waits until the admission queue is empty, then
    /// tells the coordinator to exit. Every call, first or not, blocks until
    /// the coordinator has exited and returns the same result.
    ///
    /// If the executor aborts while draining, the draining call still blocks
    /// until every admitted operation has released its slot. Other callers
    /// return as soon as the coordinator exits, which may be before running
    /// fan-out tasks have finished.
    ///
    /// # Errors
    ///
    /// The first [`Error::Execution`], [`Error::Panicked`], [`Error::Spawn`],
    /// [`Error::Aborted`] or [`Error::Cancelled`] that stopped the executor.
    pub fn wait(&self) -> Result<()> {
        let inner = &*self.inner;
        let core = &inner.core;

        if core.state.phase() == Phase::Accepting
            && inner.drain.try_fire()
            && core
                .state
                .transition(Phase::Accepting, Snapshot::new(Phase::Draining))
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(in_flight = core.admission.held(), "executor draining");

            core.admission.wait_drained();

            if core.terminal.try_fire() {
                core.state.store(Snapshot::new(Phase::Done));
                select! {
                    send(inner.work, Work::Finish) -> _ => {}
                    recv(inner.done.receiver()) -> _ => {}
                }
            }
        }

        inner.done.wait();
        core.state.error().map_or(Ok(()), Err)
    }

    /// A signal that fires once the coordinator has exited, after either a
    /// graceful drain or an abort.
    pub fn done(&self) -> Signal {
        self.inner.done.clone()
    }

    /// Aborts with [`Error::Aborted`] unless a terminal outcome is already
    /// fixed.
    ///
    /// The coordinator exits promptly and no further operation is started.
    /// Fan-out operations already running finish, and their results are
    /// discarded.
    pub fn abort(&self) {
        self.inner.core.abort(Error::Aborted);
    }

    /// The executor's cancellation token. Fires when the executor aborts for
    /// any reason; pass it as another executor's parent to chain them.
    pub fn cancellation(&self) -> Signal {
        self.inner.core.cancelled.clone()
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.inner.core.state.phase()
    }

    /// The current `{phase, error}` pair.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.core.state.load()
    }

    /// Number of operations admitted but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.core.admission.held()
    }

    /// Number of admission slots.
    pub fn queue_size(&self) -> usize {
        self.inner.core.admission.capacity()
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.inner.core.admission.pending()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("phase", &self.phase())
            .field("queue_size", &self.queue_size())
            .field("in_flight", &self.in_flight())
            .field("fan_out", &self.is_fan_out())
            .finish()
    }
}
