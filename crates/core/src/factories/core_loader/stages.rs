//! Bounded stage executors.
//!
//! Each pipeline stage is an independent FIFO work queue drained by a fixed
//! number of worker tasks. A channel acts as the queue structure; jobs are
//! passed one by one to the receiving workers running in parallel, so the
//! worker count is the stage's concurrency cap. Cancelling a job that has
//! not started is free: workers re-check the task registry when they
//! dequeue and drop jobs whose task is no longer registered.

use pictor_api::{PicError, PicResult};
use std::sync::Arc;
use tokio::sync::mpsc::{channel, error::TrySendError, Receiver, Sender};

/// The receiver end of a stage queue, shared by that stage's workers.
pub(super) type SharedReceiver<J> = Arc<tokio::sync::Mutex<Receiver<J>>>;

/// FIFO work queue feeding a fixed number of stage workers.
#[derive(Debug)]
pub(super) struct StageQueue<J> {
    tx: Sender<J>,
    rx: SharedReceiver<J>,
}

impl<J: Send + 'static> StageQueue<J> {
    pub(super) fn new(depth: usize) -> Self {
        let (tx, rx) = channel(depth.max(1));
        Self {
            tx,
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
        }
    }

    /// The shared receiver to hand to this stage's workers.
    pub(super) fn receiver(&self) -> SharedReceiver<J> {
        self.rx.clone()
    }

    /// Enqueue a job, waiting for channel capacity.
    pub(super) async fn push(&self, job: J) -> PicResult<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| PicError::other("stage queue closed"))
    }

    /// Enqueue a job from a synchronous context.
    pub(super) fn try_push(&self, job: J) -> PicResult<()> {
        self.tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => PicError::other("stage queue full"),
            TrySendError::Closed(_) => PicError::other("stage queue closed"),
        })
    }

    /// Await the next job on a shared receiver. `None` means the queue
    /// was closed.
    pub(super) async fn recv(rx: &SharedReceiver<J>) -> Option<J> {
        rx.lock().await.recv().await
    }
}
