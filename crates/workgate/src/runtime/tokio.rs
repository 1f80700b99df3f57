use crate::{Completion, Error, Result};

/// Extension trait for awaiting a [`Completion`] from the
/// [`tokio`](https://docs.rs/tokio) async runtime.
///
/// `wait` and `done` block the calling thread. These futures move the blocking
/// call onto tokio's blocking pool so the async worker thread stays free.
pub trait CompletionAsyncTokioExt: Completion {
    /// Resolves to the result of [`Completion::wait`].
    ///
    /// # Errors
    ///
    /// The terminal error of the work, or [`Error::Panicked`] if the blocking
    /// task could not be joined.
    fn wait_async(&self) -> impl Future<Output = Result<()>> + Send;

    /// Resolves once [`Completion::done`] fires.
    fn done_async(&self) -> impl Future<Output = ()> + Send;
}

impl<C: Completion> CompletionAsyncTokioExt for C {
    fn wait_async(&self) -> impl Future<Output = Result<()>> + Send {
        let completion = self.clone();
        async move {
            tokio::task::spawn_blocking(move || completion.wait())
                .await
                .unwrap_or_else(|err| Err(Error::Panicked(err.to_string())))
        }
    }

    fn done_async(&self) -> impl Future<Output = ()> + Send {
        let done = self.done();
        async move {
            if done.is_fired() {
                return;
            }
            // `Signal::wait` does not panic.
            let _ = tokio::task::spawn_blocking(move || done.wait()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkWorker, Executor};
    use core::time::Duration;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn wait_async_drains_executor() -> Result<()> {
        let executor = Executor::builder().queue_size(4).fan_out(true).build()?;
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let ran = Arc::clone(&ran);
            executor.submit(move || -> std::io::Result<()> {
                std::thread::sleep(Duration::from_millis(1));
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        executor.wait_async().await?;
        executor.done_async().await;
        assert_eq!(ran.load(Ordering::SeqCst), 16);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn done_async_observes_abort() {
        let worker = ChunkWorker::new(2, 1, |_: Vec<u8>| -> std::io::Result<()> { Ok(()) }).unwrap();
        let done = {
            let worker = worker.clone();
            tokio::spawn(async move { worker.done_async().await })
        };

        worker.abort();
        tokio::time::timeout(Duration::from_secs(5), done)
            .await
            .expect("done future did not resolve")
            .unwrap();
        assert!(matches!(worker.wait_async().await, Err(Error::Aborted)));
    }
}
