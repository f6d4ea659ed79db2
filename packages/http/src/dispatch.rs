//! The single context completion callbacks run on.

use std::panic::{self, AssertUnwindSafe};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

type Callback = Box<dyn FnOnce() + Send + 'static>;

struct Job {
    run: Callback,
    done: oneshot::Sender<()>,
}

/// A task that runs callbacks one at a time, in the order they were queued.
///
/// The task exits once every clone of the queue has been dropped.
#[derive(Clone)]
pub(crate) struct CallbackQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl CallbackQueue {
    pub(crate) fn start(runtime: &Handle) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        runtime.spawn(async move {
            while let Some(job) = receiver.recv().await {
                if panic::catch_unwind(AssertUnwindSafe(job.run)).is_err() {
                    tracing::error!("completion callback panicked");
                }
                let _ = job.done.send(());
            }
            tracing::trace!("callback queue closed");
        });
        Self { sender }
    }

    /// Queue `run` and wait until it has returned.
    pub(crate) async fn run<F>(&self, run: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let (done, finished) = oneshot::channel();
        let job = Job {
            run: Box::new(run),
            done,
        };
        if self.sender.send(job).is_err() {
            tracing::warn!("callback queue is gone, dropping completion");
            return;
        }
        let _ = finished.await;
    }
}
