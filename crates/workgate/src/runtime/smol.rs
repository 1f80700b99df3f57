use crate::{Completion, Result};

/// Extension trait for awaiting a [`Completion`] from the
/// [`smol`](https://docs.rs/smol) async runtime.
///
/// The blocking calls run on smol's blocking thread pool via
/// [`smol::unblock`].
pub trait CompletionAsyncSmolExt: Completion {
    /// Resolves to the result of [`Completion::wait`].
    ///
    /// # Errors
    ///
    /// The terminal error of the work.
    fn wait_async(&self) -> impl Future<Output = Result<()>> + Send;

    /// Resolves once [`Completion::done`] fires.
    fn done_async(&self) -> impl Future<Output = ()> + Send;
}

impl<C: Completion> CompletionAsyncSmolExt for C {
    fn wait_async(&self) -> impl Future<Output = Result<()>> + Send {
        let completion = self.clone();
        smol::unblock(move || completion.wait())
    }

    fn done_async(&self) -> impl Future<Output = ()> + Send {
        let done = self.done();
        smol::unblock(move || done.wait())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkWorker, Error};
    use std::sync::{Arc, Mutex};

    #[test]
    fn wait_async_flushes_chunks() -> Result<()> {
        smol::block_on(async {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let worker = ChunkWorker::new(4, 2, move |chunk: Vec<u32>| -> std::io::Result<()> {
                sink.lock().unwrap().extend(chunk);
                Ok(())
            })?;

            worker.feed((0..10).collect());
            CompletionAsyncSmolExt::wait_async(&worker).await?;
            CompletionAsyncSmolExt::done_async(&worker).await;
            assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
            Ok::<_, Error>(())
        })
    }

    #[test]
    fn wait_async_reports_failure() {
        let worker =
            ChunkWorker::new(1, 1, |_: Vec<u8>| -> anyhow::Result<()> { anyhow::bail!("bad chunk") })
                .unwrap();
        worker.feed(vec![1]);
        let err = smol::block_on(CompletionAsyncSmolExt::wait_async(&worker)).unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
        assert_eq!(err.to_string(), "bad chunk");
    }
}
