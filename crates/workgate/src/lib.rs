//! Admission-controlled task execution with first-failure abort, and a
//! batching layer that turns incrementally fed data into fixed-size chunks.
//!
//! # Overview
//!
//! - [`Executor`] accepts fallible, argument-less operations. At most
//!   `queue_size` operations are admitted at once; further submissions block
//!   the caller. Operations run on a single coordinator thread in submission
//!   order, or each on its own thread after [`Executor::fan_out`]. The first
//!   failure (or a call to [`Executor::abort`]) stops the executor: later
//!   submissions are dropped, and [`Executor::wait`] returns that one error.
//! - [`ChunkWorker`] buffers data through the [`Values`] capability, submits
//!   every full chunk of `chunk_size` elements to its executor as soon as it
//!   is available, and flushes the remainder on [`ChunkWorker::wait`].
//! - [`AdmissionQueue`] is the bounded counting semaphore behind both.
//! - [`signal`] provides the one-shot signals used for cancellation and
//!   completion.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use workgate::ChunkWorker;
//!
//! let total = Arc::new(Mutex::new(0_u64));
//! let sum = Arc::clone(&total);
//! let worker = ChunkWorker::builder()
//!     .chunk_size(3)
//!     .queue_size(5)
//!     .fan_out(true)
//!     .func(move |chunk: Vec<u64>| {
//!         *sum.lock().unwrap() += chunk.iter().sum::<u64>();
//!         Ok::<_, std::io::Error>(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! for batch in [vec![1, 2], vec![3, 4, 5, 6], vec![7]] {
//!     worker.feed(batch);
//! }
//! worker.wait().unwrap();
//! assert_eq!(*total.lock().unwrap(), 28);
//! ```
//!
//! # Features
//!
//! - `tracing`: emit [`tracing`](https://docs.rs/tracing) events for
//!   lifecycle transitions and dropped work.
//! - `serde`: derive `Serialize`/`Deserialize` for the configuration types.
//! - `bytes`: implement [`Values`] for `bytes::Bytes`.
//! - `cache-padded`: pad the one-time latches to a cache line.
//! - `async-tokio`, `async-smol`: futures that await completion without
//!   blocking an async worker thread.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod admission;
mod chunk;
mod completion;
mod error;
mod exec;
mod runtime;
pub mod signal;
mod state;

pub use crate::admission::*;
pub use crate::chunk::*;
pub use crate::completion::*;
pub use crate::error::*;
pub use crate::exec::*;
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
pub use crate::runtime::*;
pub use crate::signal::{Signal, Trigger};
pub use crate::state::{Phase, Snapshot};
