//! Worker threads and the task they consume.
//!
//! Every worker blocks on the shared queue, renders one task at a time
//! through the pool's [`RendererHandle`](crate::RendererHandle), and answers
//! the submitter over a oneshot channel. A worker exits once the queue is
//! closed and drained.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};

use crate::error::{RenderPoolError, Result};
use crate::pool::WorkerPoolInner;

/// Receiving end of the task queue, shared by all workers.
pub(crate) type TaskQueue = Arc<Mutex<mpsc::Receiver<Task>>>;

/// One unit of work: HTML in, PDF bytes (or an error) out.
pub(crate) struct Task {
    pub(crate) id: u64,
    pub(crate) html: String,
    pub(crate) reply: oneshot::Sender<Result<Vec<u8>>>,
    pub(crate) enqueued_at: Instant,
}

/// A spawned worker thread.
pub(crate) struct Worker {
    id: usize,
    thread: JoinHandle<()>,
}

impl Worker {
    /// Spawn worker `id` consuming from `queue`.
    pub(crate) fn spawn(
        id: usize,
        queue: TaskQueue,
        inner: Arc<WorkerPoolInner>,
    ) -> std::io::Result<Self> {
        let thread = thread::Builder::new()
            .name(format!("render-worker-{}", id))
            .spawn(move || run(id, queue, inner))?;

        Ok(Self { id, thread })
    }

    /// Wait for the worker to exit.
    pub(crate) fn join(self) {
        match self.thread.join() {
            Ok(()) => log::debug!("Worker {} stopped", self.id),
            Err(_) => log::error!("❌ Worker {} panicked", self.id),
        }
    }
}

fn run(id: usize, queue: TaskQueue, inner: Arc<WorkerPoolInner>) {
    log::debug!("Worker {} started", id);

    loop {
        // Held only while waiting, released before rendering
        let next = {
            let mut receiver = queue.lock().unwrap_or_else(PoisonError::into_inner);
            receiver.blocking_recv()
        };

        let Some(task) = next else {
            break;
        };

        inner.task_started();
        log::trace!(
            "Worker {} picked up task {} after {:?} in queue",
            id,
            task.id,
            task.enqueued_at.elapsed()
        );

        let started = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| inner.handle().render(&task.html)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                log::error!("❌ Worker {} caught a panic in task {}: {}", id, task.id, message);
                Err(RenderPoolError::RenderFailed(message))
            });

        inner.task_finished(result.is_ok());

        match &result {
            Ok(pdf) => log::debug!(
                "Worker {} finished task {} ({} bytes) in {:?}",
                id,
                task.id,
                pdf.len(),
                started.elapsed()
            ),
            Err(e) => log::warn!("⚠️ Worker {} failed task {}: {}", id, task.id, e),
        }

        if task.reply.send(result).is_err() {
            log::debug!("Submitter of task {} is gone, dropping result", task.id);
        }
    }

    log::debug!("Worker {} exiting, queue closed", id);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("renderer panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("renderer panicked: {}", message)
    } else {
        "renderer panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::panic_message;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "renderer panicked: boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "renderer panicked: bang");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "renderer panicked");
    }
}
